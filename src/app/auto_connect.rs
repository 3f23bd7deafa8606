//! Boot-time Wi-Fi auto-connect.
//!
//! Priority order:
//! 1. config persisted in the KV store
//! 2. config baked in at build time
//! 3. skip

use embedded_hal::delay::DelayNs;
use log::{debug, error, info};

use crate::app::connect::connect_to_ap;
use crate::app::credentials::WifiCredentials;
use crate::app::ports::{IpInfo, KvStorePort, WifiPort};
use crate::app::wifi_store::load_saved_wifi_config;
use crate::config::{BuildConfig, RetryPolicy};
use crate::error::WifiError;

/// Where the credentials for an auto-connect came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Saved,
    CompileTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoConnectOutcome {
    /// `None` when no usable config was found.
    pub source: Option<CredentialSource>,
    pub result: Option<Result<IpInfo, WifiError>>,
}

/// Pick the credentials to use, without touching the radio.
pub fn select_credentials<K: KvStorePort + ?Sized>(
    kv: &K,
    build: &BuildConfig,
) -> Option<(CredentialSource, WifiCredentials)> {
    if let Some(saved) = load_saved_wifi_config(kv) {
        return Some((CredentialSource::Saved, saved));
    }
    if build.has_wifi_credentials() {
        let creds = WifiCredentials::new(build.wifi_ssid, build.wifi_auth_type, build.wifi_password);
        return Some((CredentialSource::CompileTime, creds));
    }
    None
}

/// Join using the first usable config. Failures are logged, never fatal.
pub fn auto_connect<K, W, D>(
    kv: &K,
    wifi: &mut W,
    delay: &mut D,
    build: &BuildConfig,
    policy: RetryPolicy,
) -> AutoConnectOutcome
where
    K: KvStorePort + ?Sized,
    W: WifiPort + ?Sized,
    D: DelayNs + ?Sized,
{
    let Some((source, creds)) = select_credentials(kv, build) else {
        debug!("No saved wifi configuration found");
        return AutoConnectOutcome {
            source: None,
            result: None,
        };
    };

    info!("Auto-connecting to '{}' ({:?} config)", creds.ssid, source);
    let result = connect_to_ap(
        wifi,
        delay,
        &creds.ssid,
        &creds.auth_type,
        &creds.password,
        policy,
    );
    if result.is_err() {
        match source {
            CredentialSource::Saved => error!("Failed to connect to Wi-Fi AP w/ saved config"),
            CredentialSource::CompileTime => {
                error!("Failed to connect to Wi-Fi AP w/ compile-time config")
            }
        }
    }

    AutoConnectOutcome {
        source: Some(source),
        result: Some(result),
    }
}
