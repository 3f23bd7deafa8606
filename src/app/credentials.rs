//! Bounded Wi-Fi credentials and the connect parameters built from them.

use log::error;

use crate::app::auth::AuthType;
use crate::config::WIFI_CONFIG_MAX_SIZE;
use crate::error::WifiError;

/// One stored Wi-Fi config value.
pub type ConfigString = heapless::String<WIFI_CONFIG_MAX_SIZE>;

/// Copy `s` into a [`ConfigString`], cutting it at the last character
/// boundary that fits.
pub fn truncate(s: &str) -> ConfigString {
    let mut end = s.len().min(WIFI_CONFIG_MAX_SIZE);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = ConfigString::new();
    // Cannot fail: `end` is within capacity.
    let _ = out.push_str(&s[..end]);
    out
}

/// SSID, auth tag and password exactly as entered or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: ConfigString,
    pub auth_type: ConfigString,
    pub password: ConfigString,
}

impl WifiCredentials {
    pub fn new(ssid: &str, auth_type: &str, password: &str) -> Self {
        Self {
            ssid: truncate(ssid),
            auth_type: truncate(auth_type),
            password: truncate(password),
        }
    }

    pub fn connect_params(&self) -> Result<ConnectParams, WifiError> {
        ConnectParams::build(&self.ssid, &self.auth_type, &self.password)
    }
}

/// Parameters handed to [`WifiPort::connect`](super::ports::WifiPort::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub ssid: ConfigString,
    pub auth: AuthType,
    /// Empty for open networks.
    pub password: ConfigString,
}

impl ConnectParams {
    /// Build from command-line strings.
    ///
    /// An unrecognised auth tag is a hard error. The password is ignored
    /// for open networks.
    pub fn build(ssid: &str, auth_type: &str, password: &str) -> Result<Self, WifiError> {
        let auth = AuthType::parse(auth_type);
        if !auth.is_supported() {
            error!("Unsupported auth type: '{}'", auth_type);
            return Err(WifiError::UnsupportedAuth);
        }

        let password = if auth.requires_password() {
            truncate(password)
        } else {
            ConfigString::new()
        };

        Ok(Self {
            ssid: truncate(ssid),
            auth,
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_are_kept() {
        assert_eq!(truncate("HomeNet").as_str(), "HomeNet");
    }

    #[test]
    fn long_values_are_cut_to_capacity() {
        let long = "x".repeat(100);
        assert_eq!(truncate(&long).len(), WIFI_CONFIG_MAX_SIZE);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 63 ASCII bytes followed by a 2-byte character straddling the limit.
        let s = format!("{}é", "a".repeat(63));
        let t = truncate(&s);
        assert_eq!(t.len(), 63);
        assert!(t.chars().all(|c| c == 'a'));
    }

    #[test]
    fn open_network_drops_password() {
        let p = ConnectParams::build("Cafe", "open", "ignored").unwrap();
        assert_eq!(p.auth, AuthType::Open);
        assert!(p.password.is_empty());
    }

    #[test]
    fn secured_network_keeps_password() {
        let p = ConnectParams::build("HomeNet", "wpa2_aes", "hunter22").unwrap();
        assert_eq!(p.auth, AuthType::Wpa2Aes);
        assert_eq!(p.password.as_str(), "hunter22");
    }

    #[test]
    fn unknown_auth_is_rejected() {
        assert_eq!(
            ConnectParams::build("HomeNet", "wpa9", "hunter22"),
            Err(WifiError::UnsupportedAuth)
        );
    }

    #[test]
    fn credentials_build_params() {
        let c = WifiCredentials::new("Lab", "wpa3", "correct horse");
        let p = c.connect_params().unwrap();
        assert_eq!(p.ssid.as_str(), "Lab");
        assert_eq!(p.auth, AuthType::Wpa3);
    }
}
