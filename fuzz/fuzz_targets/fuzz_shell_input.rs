//! Fuzz target: console line editor
//!
//! Feeds arbitrary bytes to the shell with the full command table and
//! simulated adapters behind it. Verifies:
//! - No panics from line editing, tokenising or argument handling
//! - The prompt is reprinted after every line ending
//!
//! `test_assert` panics on purpose, so lines naming it are skipped.
//!
//! cargo fuzz run fuzz_shell_input

#![no_main]

use libfuzzer_sys::fuzz_target;
use mflt_demo::adapters::device_id::DeviceInfo;
use mflt_demo::adapters::nvs::NvsAdapter;
use mflt_demo::adapters::uart::UartAdapter;
use mflt_demo::adapters::wifi::WifiAdapter;
use mflt_demo::app::commands::AppCommands;
use mflt_demo::chunks::ChunkStore;
use mflt_demo::shell::{Shell, PROMPT};
use mflt_demo::tasks::StdDelay;

static STORE: ChunkStore = ChunkStore::new();

fn no_restart() {}

fuzz_target!(|data: &[u8]| {
    if data.windows(b"test_assert".len()).any(|w| w == b"test_assert") {
        return;
    }
    let Ok(kv) = NvsAdapter::new() else {
        return;
    };

    let mut wifi = WifiAdapter::new();
    let _ = mflt_demo::app::ports::WifiPort::init(&mut wifi);

    let commands = AppCommands::new(kv, wifi, StdDelay, &STORE, DeviceInfo::default())
        .with_restart(no_restart);
    let mut shell = Shell::new(commands);
    let mut uart = UartAdapter::new();

    for &b in data {
        shell.receive_char(b, &mut uart);
        if b == b'\r' || b == b'\n' {
            let out = uart.take_output();
            assert!(out.is_empty() || out.ends_with(PROMPT));
        }
    }
});
