//! Boot-time credential selection and auto-connect.

use mflt_demo::app::auto_connect::{auto_connect, CredentialSource};
use mflt_demo::app::wifi_store::{save_wifi_config, WIFI_NAMESPACE, WIFI_PASSWORD_KEY};
use mflt_demo::config::{BuildConfig, RetryPolicy};
use mflt_demo::error::WifiError;

use crate::mocks::{MockKv, MockWifi, RecordingDelay};

fn build_with_wifi() -> BuildConfig {
    BuildConfig {
        wifi_ssid: "BuildNet",
        wifi_auth_type: "wpa2",
        wifi_password: "buildpass",
        ..BuildConfig::default()
    }
}

// ── Source precedence ─────────────────────────────────────────

#[test]
fn saved_config_is_preferred_over_compile_time() {
    let mut kv = MockKv::new();
    save_wifi_config(&mut kv, "SavedNet", "wpa3", "savedpass").unwrap();
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let outcome = auto_connect(
        &kv,
        &mut wifi,
        &mut delay,
        &build_with_wifi(),
        RetryPolicy::AUTO_CONNECT,
    );

    assert_eq!(outcome.source, Some(CredentialSource::Saved));
    assert!(matches!(outcome.result, Some(Ok(_))));
    assert_eq!(wifi.connected_ssids(), vec!["SavedNet".to_string()]);
}

#[test]
fn compile_time_config_used_when_nothing_saved() {
    let kv = MockKv::new();
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let outcome = auto_connect(
        &kv,
        &mut wifi,
        &mut delay,
        &build_with_wifi(),
        RetryPolicy::AUTO_CONNECT,
    );

    assert_eq!(outcome.source, Some(CredentialSource::CompileTime));
    assert_eq!(wifi.connected_ssids(), vec!["BuildNet".to_string()]);
}

#[test]
fn no_config_skips_join_entirely() {
    let kv = MockKv::new();
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let outcome = auto_connect(
        &kv,
        &mut wifi,
        &mut delay,
        &BuildConfig::default(),
        RetryPolicy::AUTO_CONNECT,
    );

    assert_eq!(outcome.source, None);
    assert_eq!(outcome.result, None);
    assert!(wifi.calls.is_empty());
}

#[test]
fn unreadable_saved_value_falls_back_to_compile_time() {
    let mut kv = MockKv::new();
    save_wifi_config(&mut kv, "SavedNet", "wpa3", "savedpass").unwrap();
    kv.failing_reads.push(WIFI_PASSWORD_KEY.to_string());
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let outcome = auto_connect(
        &kv,
        &mut wifi,
        &mut delay,
        &build_with_wifi(),
        RetryPolicy::AUTO_CONNECT,
    );

    assert_eq!(outcome.source, Some(CredentialSource::CompileTime));
}

#[test]
fn partial_saved_config_is_ignored() {
    let mut kv = MockKv::new();
    kv.put(WIFI_NAMESPACE, "wifi_ssid", b"Half");
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let outcome = auto_connect(
        &kv,
        &mut wifi,
        &mut delay,
        &BuildConfig::default(),
        RetryPolicy::AUTO_CONNECT,
    );

    assert_eq!(outcome.source, None);
}

// ── Retry at boot ─────────────────────────────────────────────

#[test]
fn boot_join_retries_once_after_five_seconds() {
    let kv = MockKv::new();
    let mut wifi = MockWifi::failing(5, 0x3001);
    let mut delay = RecordingDelay::default();

    let outcome = auto_connect(
        &kv,
        &mut wifi,
        &mut delay,
        &build_with_wifi(),
        RetryPolicy::AUTO_CONNECT,
    );

    assert_eq!(outcome.result, Some(Err(WifiError::ConnectFailed(0x3001))));
    assert_eq!(wifi.connect_count(), 2);
    assert_eq!(delay.waits_ms, vec![5000]);
}

#[test]
fn saved_config_with_bad_auth_makes_no_attempt() {
    let mut kv = MockKv::new();
    save_wifi_config(&mut kv, "SavedNet", "bogus", "pw").unwrap();
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let outcome = auto_connect(
        &kv,
        &mut wifi,
        &mut delay,
        &build_with_wifi(),
        RetryPolicy::AUTO_CONNECT,
    );

    assert_eq!(outcome.source, Some(CredentialSource::Saved));
    assert_eq!(outcome.result, Some(Err(WifiError::UnsupportedAuth)));
    assert_eq!(wifi.connect_count(), 0);
}
