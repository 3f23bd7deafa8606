//! Retry behaviour of the Wi-Fi join path.

use mflt_demo::app::connect::connect_to_ap;
use mflt_demo::config::RetryPolicy;
use mflt_demo::error::WifiError;

use crate::mocks::{MockWifi, RecordingDelay, WifiCall};

const POLICY: RetryPolicy = RetryPolicy {
    attempts: 3,
    interval_ms: 5000,
};

// ── Success paths ─────────────────────────────────────────────

#[test]
fn first_attempt_success_does_not_wait() {
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let ip = connect_to_ap(&mut wifi, &mut delay, "HomeNet", "wpa2_aes", "hunter22", POLICY)
        .expect("join should succeed");

    assert_eq!(ip.ip.octets(), [10, 0, 0, 7]);
    assert_eq!(wifi.connect_count(), 1);
    assert!(delay.waits_ms.is_empty());
}

#[test]
fn succeeds_on_last_allowed_attempt() {
    let mut wifi = MockWifi::failing(2, 0x3001);
    let mut delay = RecordingDelay::default();

    let result = connect_to_ap(&mut wifi, &mut delay, "HomeNet", "wpa2", "hunter22", POLICY);

    assert!(result.is_ok());
    assert_eq!(wifi.connect_count(), 3);
    assert_eq!(delay.waits_ms, vec![5000, 5000]);
}

#[test]
fn existing_link_is_dropped_before_join() {
    let mut wifi = MockWifi::new();
    wifi.connected = true;
    let mut delay = RecordingDelay::default();

    connect_to_ap(&mut wifi, &mut delay, "Other", "open", "", POLICY).unwrap();

    assert_eq!(
        wifi.calls,
        vec![WifiCall::Disconnect, WifiCall::Connect("Other".into())]
    );
}

// ── Failure paths ─────────────────────────────────────────────

#[test]
fn exhausted_attempts_wait_between_but_not_after() {
    let mut wifi = MockWifi::failing(10, 0x3001);
    let mut delay = RecordingDelay::default();

    let result = connect_to_ap(&mut wifi, &mut delay, "HomeNet", "wpa3", "hunter22", POLICY);

    assert_eq!(result, Err(WifiError::ConnectFailed(0x3001)));
    assert_eq!(wifi.connect_count(), 3);
    assert_eq!(delay.waits_ms, vec![5000, 5000]);
}

#[test]
fn unsupported_auth_makes_no_attempt() {
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();

    let result = connect_to_ap(&mut wifi, &mut delay, "HomeNet", "wep", "secret", POLICY);

    assert_eq!(result, Err(WifiError::UnsupportedAuth));
    assert!(wifi.calls.is_empty());
    assert!(delay.waits_ms.is_empty());
}

#[test]
fn zero_attempt_policy_is_rejected() {
    let mut wifi = MockWifi::new();
    let mut delay = RecordingDelay::default();
    let policy = RetryPolicy {
        attempts: 0,
        interval_ms: 5000,
    };

    let result = connect_to_ap(&mut wifi, &mut delay, "HomeNet", "open", "", policy);

    assert_eq!(result, Err(WifiError::NoAttempts));
    assert_eq!(wifi.connect_count(), 0);
}

#[test]
fn interactive_policy_tries_once() {
    let mut wifi = MockWifi::failing(1, 0x3002);
    let mut delay = RecordingDelay::default();

    let result = connect_to_ap(
        &mut wifi,
        &mut delay,
        "HomeNet",
        "wpa2",
        "hunter22",
        RetryPolicy::INTERACTIVE,
    );

    assert!(result.is_err());
    assert_eq!(wifi.connect_count(), 1);
    assert!(delay.waits_ms.is_empty());
}
