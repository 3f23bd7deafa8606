//! End-to-end console sessions: UART bytes in, shell output out.

use mflt_demo::adapters::device_id::DeviceInfo;
use mflt_demo::adapters::uart::UartAdapter;
use mflt_demo::app::commands::AppCommands;
use mflt_demo::app::wifi_store::{load_saved_wifi_config, WIFI_NAMESPACE};
use mflt_demo::chunks::ChunkStore;
use mflt_demo::config::ConsoleConfig;
use mflt_demo::shell::PROMPT;
use mflt_demo::tasks::cli::{CliTask, Poll};

use crate::mocks::{MockKv, MockWifi, RecordingDelay};

type Session = CliTask<UartAdapter, AppCommands<MockKv, MockWifi, RecordingDelay>, RecordingDelay>;

fn session(uart: &UartAdapter, wifi: MockWifi) -> (Session, &'static ChunkStore) {
    let store: &'static ChunkStore = Box::leak(Box::new(ChunkStore::new()));
    let commands = AppCommands::new(
        MockKv::new(),
        wifi,
        RecordingDelay::default(),
        store,
        DeviceInfo::default(),
    );
    let cli = CliTask::new(
        uart.clone(),
        commands,
        RecordingDelay::default(),
        ConsoleConfig::default(),
    );
    (cli, store)
}

/// Feed a line and poll until the console is drained.
fn type_line(cli: &mut Session, uart: &UartAdapter, line: &str) -> String {
    uart.feed(line.as_bytes());
    uart.feed(b"\r");
    while cli.poll_once() != Poll::Idle {}
    uart.take_output()
}

// ── Session basics ────────────────────────────────────────────

#[test]
fn boot_prints_prompt_and_help_lists_commands() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());
    cli.boot();
    assert!(uart.take_output().ends_with(PROMPT));

    let out = type_line(&mut cli, &uart, "help");
    assert!(out.contains("wifi_join: "));
    assert!(out.contains("export: "));
    assert!(out.contains("help: Lists all commands"));
    assert!(out.ends_with(PROMPT));
}

#[test]
fn unknown_command_is_reported() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());

    let out = type_line(&mut cli, &uart, "reboot_now");
    assert!(out.contains("Unknown command: reboot_now\r\n"));
    assert!(out.contains("Type 'help' to list all commands"));
}

#[test]
fn backspace_edits_the_line() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());

    let out = type_line(&mut cli, &uart, "helq\x08p");
    assert!(out.contains("\x08 \x08"));
    assert!(out.contains("help: Lists all commands"));
}

// ── Wi-Fi commands ────────────────────────────────────────────

#[test]
fn wifi_save_persists_and_wifi_clear_erases() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());

    let out = type_line(&mut cli, &uart, "wifi_save HomeNet wpa2_aes hunter22");
    assert!(out.contains("Saved Wi-Fi config for 'HomeNet'"));
    let saved = load_saved_wifi_config(cli.shell().commands().kv()).expect("config saved");
    assert_eq!(saved.ssid.as_str(), "HomeNet");
    assert_eq!(saved.password.as_str(), "hunter22");

    type_line(&mut cli, &uart, "wifi_clear");
    assert!(cli.shell().commands().kv().keys_in(WIFI_NAMESPACE).is_empty());
}

#[test]
fn wifi_save_accepts_full_length_values() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());
    let ssid = "S".repeat(64);
    let password = "p".repeat(64);

    let out = type_line(
        &mut cli,
        &uart,
        &format!("wifi_save {} wpa2_aes {}", ssid, password),
    );
    assert!(!out.contains("command too long"));
    let saved = load_saved_wifi_config(cli.shell().commands().kv()).expect("config saved");
    assert_eq!(saved.ssid.as_str(), ssid);
    assert_eq!(saved.auth_type.as_str(), "wpa2_aes");
    assert_eq!(saved.password.as_str(), password);
}

#[test]
fn wifi_join_with_long_ssid_reaches_the_driver() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());
    let ssid = "N".repeat(48);

    let out = type_line(&mut cli, &uart, &format!("wifi_join {} wpa2 hunter22", ssid));
    assert!(!out.contains("command too long"));
    assert_eq!(cli.shell().commands().wifi().connect_count(), 1);
}

#[test]
fn wifi_join_failure_prints_error_and_keeps_shell_alive() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::failing(1, 0x3001));

    let out = type_line(&mut cli, &uart, "wifi_join HomeNet wpa2 hunter22");
    assert!(out.contains("ERROR: connect failed (0x3001)"));
    assert_eq!(cli.shell().commands().wifi().connect_count(), 1);

    let out = type_line(&mut cli, &uart, "wifi_join HomeNet wpa2 hunter22");
    assert!(out.contains("Connected to 'HomeNet', IP 10.0.0.7"));
}

#[test]
fn wifi_join_without_args_prints_usage() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());

    let out = type_line(&mut cli, &uart, "wifi_join");
    assert!(out.contains("ERROR: usage: wifi_join"));
    assert!(cli.shell().commands().wifi().calls.is_empty());
}

// ── Diagnostics commands ──────────────────────────────────────

#[test]
fn trace_then_export_prints_one_chunk() {
    let uart = UartAdapter::new();
    let (mut cli, store) = session(&uart, MockWifi::new());

    type_line(&mut cli, &uart, "test_trace");
    assert_eq!(store.len(), 1);

    let out = type_line(&mut cli, &uart, "export");
    let chunk_lines: Vec<&str> = out.lines().filter(|l| l.starts_with("MC:")).collect();
    assert_eq!(chunk_lines.len(), 1);
    assert!(chunk_lines[0].trim_end().ends_with(':'));
    assert!(store.is_empty());
}

#[test]
fn get_core_with_empty_log() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());

    let out = type_line(&mut cli, &uart, "get_core");
    assert!(out.contains("No crash entries stored"));
}

#[test]
fn device_info_reports_serial() {
    let uart = UartAdapter::new();
    let (mut cli, _) = session(&uart, MockWifi::new());

    let out = type_line(&mut cli, &uart, "get_device_info");
    assert!(out.contains("S/N: UNKNOWN"));
    assert!(out.contains("SW type: app-fw"));
}
