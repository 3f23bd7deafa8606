//! Device identity reported with every chunk upload.
//!
//! The serial is derived from the factory MAC address, which is stable
//! across reboots (burned into eFuse). It is formatted as the high then
//! low 32-bit words of the 64-bit unique id, upper-case hex without zero
//! padding.

use core::fmt::Write;

use crate::config::{HARDWARE_VERSION, SOFTWARE_TYPE, SOFTWARE_VERSION};

pub type SerialString = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

pub const UNKNOWN_SERIAL: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_serial: SerialString,
    pub software_type: &'static str,
    pub software_version: &'static str,
    pub hardware_version: &'static str,
}

impl DeviceInfo {
    /// Identity with the serial derived from `unique_id`.
    pub fn from_unique_id(unique_id: u64) -> Self {
        Self {
            device_serial: device_serial(unique_id),
            ..Self::default()
        }
    }

    /// Identity of this chip.
    pub fn read() -> Self {
        Self::from_unique_id(unique_id(&read_mac()))
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        let mut serial = SerialString::new();
        let _ = serial.push_str(UNKNOWN_SERIAL);
        Self {
            device_serial: serial,
            software_type: SOFTWARE_TYPE,
            software_version: SOFTWARE_VERSION,
            hardware_version: HARDWARE_VERSION,
        }
    }
}

/// Upper-case hex of the high word followed by the low word.
pub fn device_serial(unique_id: u64) -> SerialString {
    let mut s = SerialString::new();
    let hi = (unique_id >> 32) as u32;
    let lo = unique_id as u32;
    let _ = write!(s, "{:X}{:X}", hi, lo);
    s
}

/// MAC bytes packed big-endian into the low 48 bits.
pub fn unique_id(mac: &MacAddress) -> u64 {
    mac.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_is_high_then_low_word() {
        assert_eq!(device_serial(0x0000_DEAD_BEEF_CAFE).as_str(), "DEADBEEFCAFE");
    }

    #[test]
    fn serial_words_are_not_zero_padded() {
        assert_eq!(device_serial(0x0000_0001_0000_000A).as_str(), "1A");
        assert_eq!(device_serial(0).as_str(), "00");
    }

    #[test]
    fn unique_id_is_big_endian_mac() {
        let mac = [0x00, 0x11, 0x22, 0xAA, 0xBB, 0xCC];
        assert_eq!(unique_id(&mac), 0x0011_22AA_BBCC);
    }

    #[test]
    fn default_identity() {
        let info = DeviceInfo::default();
        assert_eq!(info.device_serial.as_str(), "UNKNOWN");
        assert_eq!(info.software_type, "app-fw");
        assert_eq!(info.software_version, "1.0.0-dev");
        assert_eq!(info.hardware_version, "dvt1");
    }

    #[test]
    fn sim_identity_is_deterministic() {
        assert_eq!(DeviceInfo::read(), DeviceInfo::read());
        assert_eq!(DeviceInfo::read().device_serial.as_str(), "DEADBEEFCAFE");
    }
}
