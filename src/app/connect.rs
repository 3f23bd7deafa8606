//! Access-point join with a fixed retry policy, and the scan wrapper.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::app::credentials::ConnectParams;
use crate::app::ports::{IpInfo, ScanRecord, WifiPort};
use crate::config::RetryPolicy;
use crate::error::WifiError;

/// Join `ssid`, retrying per `policy`.
///
/// Returns the result of the last attempt. An unsupported auth tag fails
/// before any attempt is made.
pub fn connect_to_ap<W, D>(
    wifi: &mut W,
    delay: &mut D,
    ssid: &str,
    auth_type: &str,
    password: &str,
    policy: RetryPolicy,
) -> Result<IpInfo, WifiError>
where
    W: WifiPort + ?Sized,
    D: DelayNs + ?Sized,
{
    let params = ConnectParams::build(ssid, auth_type, password).map_err(|e| {
        error!("Could not parse args correctly");
        e
    })?;

    if policy.attempts == 0 {
        return Err(WifiError::NoAttempts);
    }

    let mut last_err = WifiError::NoAttempts;
    for attempt in 1..=policy.attempts {
        match try_connect(wifi, &params) {
            Ok(ip) => return Ok(ip),
            Err(e) => {
                last_err = e;
                if attempt < policy.attempts {
                    warn!(
                        "Connection to Wi-Fi network failed ({}). Retrying in {} ms...",
                        e, policy.interval_ms
                    );
                    delay.delay_ms(policy.interval_ms);
                } else {
                    warn!("Connection to Wi-Fi network failed ({})", e);
                }
            }
        }
    }

    error!("Exceeded maximum Wi-Fi connection attempts ({})", policy.attempts);
    Err(last_err)
}

fn try_connect<W: WifiPort + ?Sized>(
    wifi: &mut W,
    params: &ConnectParams,
) -> Result<IpInfo, WifiError> {
    if wifi.is_connected() {
        if let Err(e) = wifi.disconnect() {
            warn!("Disconnect before join failed: {}", e);
        }
    }

    let ip = wifi.connect(params)?;
    info!("Successfully connected to Wi-Fi network '{}'", params.ssid);
    info!("IPv4 address assigned: {}", ip.ip);
    Ok(ip)
}

// ───────────────────────────────────────────────────────────────
// Scan
// ───────────────────────────────────────────────────────────────

/// Progress reported to the scan callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent<'a> {
    Result(&'a ScanRecord),
    Complete,
}

/// Fixed-width scan result line.
pub struct ScanLine<'a>(pub &'a ScanRecord);

impl fmt::Display for ScanLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        let b = r.bssid;
        write!(
            f,
            "{:<20} {:<14} {:<10} {:<7} {:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            r.ssid.as_str(),
            r.auth.as_str(),
            r.rssi,
            r.channel,
            b[0],
            b[1],
            b[2],
            b[3],
            b[4],
            b[5]
        )
    }
}

pub const SCAN_END_MARKER: &str = "#### Scan Results END ####";

/// Scan for APs, reporting each one and then completion through `report`.
///
/// Returns the number of APs found.
pub fn scan_aps<W, F>(wifi: &mut W, mut report: F) -> Result<usize, WifiError>
where
    W: WifiPort + ?Sized,
    F: FnMut(ScanEvent<'_>),
{
    let records = match wifi.scan() {
        Ok(records) => records,
        Err(WifiError::ScanInProgress) => return Err(WifiError::ScanInProgress),
        Err(e) => {
            error!("Error while scanning: {}", e);
            return Err(e);
        }
    };

    for record in &records {
        report(ScanEvent::Result(record));
    }
    report(ScanEvent::Complete);
    Ok(records.len())
}
