//! Persisted Wi-Fi configuration.
//!
//! Three string values under fixed keys. A config is only usable when all
//! three keys are present and readable.

use log::{info, warn};

use crate::app::credentials::{truncate, ConfigString, WifiCredentials};
use crate::app::ports::KvStorePort;
use crate::config::WIFI_CONFIG_MAX_SIZE;
use crate::error::KvError;

pub const WIFI_NAMESPACE: &str = "app";
pub const WIFI_SSID_KEY: &str = "wifi_ssid";
pub const WIFI_AUTH_TYPE_KEY: &str = "wifi_auth_type";
pub const WIFI_PASSWORD_KEY: &str = "wifi_password";

pub const WIFI_KEYS: [&str; 3] = [WIFI_SSID_KEY, WIFI_AUTH_TYPE_KEY, WIFI_PASSWORD_KEY];

/// Write the three Wi-Fi keys, each truncated to the stored maximum.
pub fn save_wifi_config<K: KvStorePort + ?Sized>(
    kv: &mut K,
    ssid: &str,
    auth_type: &str,
    password: &str,
) -> Result<(), KvError> {
    let values = [truncate(ssid), truncate(auth_type), truncate(password)];
    for (key, value) in WIFI_KEYS.iter().zip(values.iter()) {
        kv.write(WIFI_NAMESPACE, key, value.as_bytes())?;
    }
    info!("Saved Wi-Fi config for '{}'", values[0]);
    Ok(())
}

/// True when every Wi-Fi key is present.
pub fn has_saved_wifi_config<K: KvStorePort + ?Sized>(kv: &K) -> bool {
    WIFI_KEYS.iter().all(|key| kv.exists(WIFI_NAMESPACE, key))
}

/// Load the persisted config, or `None` if any key is missing or unreadable.
pub fn load_saved_wifi_config<K: KvStorePort + ?Sized>(kv: &K) -> Option<WifiCredentials> {
    if !has_saved_wifi_config(kv) {
        return None;
    }

    let ssid = read_value(kv, WIFI_SSID_KEY)?;
    let auth_type = read_value(kv, WIFI_AUTH_TYPE_KEY)?;
    let password = read_value(kv, WIFI_PASSWORD_KEY)?;

    Some(WifiCredentials {
        ssid,
        auth_type,
        password,
    })
}

/// Remove all three keys.
pub fn clear_wifi_config<K: KvStorePort + ?Sized>(kv: &mut K) -> Result<(), KvError> {
    for key in WIFI_KEYS {
        kv.delete(WIFI_NAMESPACE, key)?;
    }
    info!("Cleared saved Wi-Fi config");
    Ok(())
}

fn read_value<K: KvStorePort + ?Sized>(kv: &K, key: &str) -> Option<ConfigString> {
    read_str(kv, key)
        .map_err(|e| warn!("Saved Wi-Fi config unusable: '{}' read failed ({})", key, e))
        .ok()
}

/// Values are text; anything else is treated as a corrupted entry.
fn read_str<K: KvStorePort + ?Sized>(kv: &K, key: &str) -> Result<ConfigString, KvError> {
    let mut buf = [0u8; WIFI_CONFIG_MAX_SIZE];
    let len = kv.read(WIFI_NAMESPACE, key, &mut buf)?;
    let s = core::str::from_utf8(&buf[..len]).map_err(|_| KvError::Corrupted)?;
    Ok(truncate(s))
}
