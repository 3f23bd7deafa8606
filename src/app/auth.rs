//! Wi-Fi security types and their command-line tags.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    Open,
    Wep,
    WpaAes,
    WpaTkip,
    /// WPA2 with both AES and TKIP ciphers.
    Wpa2Mixed,
    Wpa2Aes,
    Wpa2Tkip,
    Wpa3,
    /// WPA3/WPA2 transition mode.
    Wpa3Wpa2,
    Unknown,
}

/// Tags accepted by `wifi_join` / `wifi_save` and the compile-time config.
///
/// WEP is deliberately absent: it is shown in scan output but never joined.
pub const AUTH_TYPE_TABLE: &[(&str, AuthType)] = &[
    ("open", AuthType::Open),
    ("wpa2_tkip", AuthType::Wpa2Tkip),
    ("wpa2_aes", AuthType::Wpa2Aes),
    ("wpa2", AuthType::Wpa2Mixed),
    ("wpa_aes", AuthType::WpaAes),
    ("wpa_tkip", AuthType::WpaTkip),
    ("wpa3", AuthType::Wpa3),
    ("wpa3_wpa2", AuthType::Wpa3Wpa2),
];

impl AuthType {
    /// Parse a tag; anything not in [`AUTH_TYPE_TABLE`] is `Unknown`.
    pub fn parse(tag: &str) -> Self {
        AUTH_TYPE_TABLE
            .iter()
            .find(|(name, _)| *name == tag)
            .map_or(Self::Unknown, |(_, auth)| *auth)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Wep => "wep",
            Self::WpaAes => "wpa_aes",
            Self::WpaTkip => "wpa_tkip",
            Self::Wpa2Mixed => "wpa2",
            Self::Wpa2Aes => "wpa2_aes",
            Self::Wpa2Tkip => "wpa2_tkip",
            Self::Wpa3 => "wpa3",
            Self::Wpa3Wpa2 => "wpa3_wpa2",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn requires_password(self) -> bool {
        !matches!(self, Self::Open | Self::Unknown)
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
