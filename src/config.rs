//! Application configuration
//!
//! Compile-time settings (Wi-Fi fallback credentials, project key, upload
//! interval) plus the retry, console and task constants the rest of the
//! firmware reads instead of scattering literals across call sites.

use log::warn;
use serde::{Deserialize, Serialize};

/// Maximum stored size (bytes) of each Wi-Fi config value.
pub const WIFI_CONFIG_MAX_SIZE: usize = 64;

/// Default chunk upload interval when `MEMFAULT_POST_SEND_INTERVAL_MS` is unset.
pub const DEFAULT_POST_SEND_INTERVAL_MS: u32 = 60 * 1000;

/// Device identity reported alongside every upload.
pub const SOFTWARE_TYPE: &str = "app-fw";
pub const SOFTWARE_VERSION: &str = "1.0.0-dev";
pub const HARDWARE_VERSION: &str = "dvt1";

// ───────────────────────────────────────────────────────────────
// Retry policy
// ───────────────────────────────────────────────────────────────

/// How many times a Wi-Fi join is attempted and how long to wait between
/// failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval_ms: u32,
}

impl RetryPolicy {
    /// Used by the boot-time auto-connect.
    pub const AUTO_CONNECT: Self = Self {
        attempts: 2,
        interval_ms: 5000,
    };

    /// Used by the `wifi_join` shell command.
    pub const INTERACTIVE: Self = Self {
        attempts: 1,
        interval_ms: 5000,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::AUTO_CONNECT
    }
}

// ───────────────────────────────────────────────────────────────
// Console
// ───────────────────────────────────────────────────────────────

/// UART console timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub baudrate: u32,
    /// Sleep when no byte is pending.
    pub idle_poll_ms: u32,
    /// Read timeout once a byte is known to be pending.
    pub read_timeout_ms: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            idle_poll_ms: 10,
            read_timeout_ms: 1,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Task sizing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub stack_kb: usize,
    pub priority: u8,
}

impl TaskConfig {
    pub const CLI: Self = Self {
        stack_kb: 8,
        priority: 5,
    };

    /// TLS handshakes need the larger stack.
    pub const HTTP: Self = Self {
        stack_kb: 20,
        priority: 5,
    };
}

// ───────────────────────────────────────────────────────────────
// Build-time configuration
// ───────────────────────────────────────────────────────────────

/// Values baked in at build time through environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub wifi_ssid: &'static str,
    pub wifi_auth_type: &'static str,
    pub wifi_password: &'static str,
    pub project_key: &'static str,
    pub post_interval_ms: u32,
}

impl BuildConfig {
    /// Read the compile-time environment.
    pub fn from_env() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or(""),
            wifi_auth_type: option_env!("WIFI_AUTH_TYPE").unwrap_or(""),
            wifi_password: option_env!("WIFI_PASSWORD").unwrap_or(""),
            project_key: option_env!("MEMFAULT_PROJECT_KEY").unwrap_or(""),
            post_interval_ms: parse_interval(option_env!("MEMFAULT_POST_SEND_INTERVAL_MS")),
        }
    }

    /// True when all three fallback Wi-Fi values were provided.
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
            && !self.wifi_auth_type.is_empty()
            && !self.wifi_password.is_empty()
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: "",
            wifi_auth_type: "",
            wifi_password: "",
            project_key: "",
            post_interval_ms: DEFAULT_POST_SEND_INTERVAL_MS,
        }
    }
}

fn parse_interval(raw: Option<&str>) -> u32 {
    match raw.map(str::trim) {
        None | Some("") => DEFAULT_POST_SEND_INTERVAL_MS,
        Some(s) => match s.parse::<u32>() {
            Ok(ms) if ms > 0 => ms,
            _ => {
                warn!(
                    "MEMFAULT_POST_SEND_INTERVAL_MS='{}' is invalid, using {} ms",
                    s, DEFAULT_POST_SEND_INTERVAL_MS
                );
                DEFAULT_POST_SEND_INTERVAL_MS
            }
        },
    }
}
