//! WiFi station-mode adapter.
//!
//! Implements [`WifiPort`]. The handle is cloneable: the HTTP task and the
//! shell share one driver, serialised by an internal mutex, and whichever
//! caller connects or disconnects last determines the link state.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: a scripted simulation for host-side tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::info;
#[cfg(not(target_os = "espidf"))]
use log::warn;

use crate::app::auth::AuthType;
use crate::app::credentials::ConnectParams;
use crate::app::ports::{IpInfo, ScanRecord, WifiPort, WifiStats};
use crate::diagnostics::uptime_secs;
use crate::error::WifiError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Auth mapping
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn auth_method(auth: AuthType) -> AuthMethod {
    match auth {
        AuthType::Open | AuthType::Unknown => AuthMethod::None,
        AuthType::Wep => AuthMethod::WEP,
        AuthType::WpaAes | AuthType::WpaTkip => AuthMethod::WPA,
        AuthType::Wpa2Aes | AuthType::Wpa2Tkip | AuthType::Wpa2Mixed => AuthMethod::WPA2Personal,
        AuthType::Wpa3 => AuthMethod::WPA3Personal,
        AuthType::Wpa3Wpa2 => AuthMethod::WPA2WPA3Personal,
    }
}

#[cfg(target_os = "espidf")]
fn auth_type(method: Option<AuthMethod>) -> AuthType {
    match method {
        Some(AuthMethod::None) => AuthType::Open,
        Some(AuthMethod::WEP) => AuthType::Wep,
        Some(AuthMethod::WPA) => AuthType::WpaAes,
        Some(AuthMethod::WPAWPA2Personal) => AuthType::Wpa2Mixed,
        Some(AuthMethod::WPA2Personal) => AuthType::Wpa2Aes,
        Some(AuthMethod::WPA3Personal) => AuthType::Wpa3,
        Some(AuthMethod::WPA2WPA3Personal) => AuthType::Wpa3Wpa2,
        _ => AuthType::Unknown,
    }
}

// ───────────────────────────────────────────────────────────────
// Driver state
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
struct Driver {
    wifi: BlockingWifi<EspWifi<'static>>,
}

/// Behaviour of the simulated radio.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct Driver {
    started: bool,
    connected: bool,
    fail_init: bool,
    /// Upcoming connect calls that fail.
    fail_connects: u32,
    connect_calls: u32,
    disconnect_calls: u32,
    last_params: Option<ConnectParams>,
    scan_results: Vec<ScanRecord>,
}

// ───────────────────────────────────────────────────────────────
// Connection metrics
// ───────────────────────────────────────────────────────────────

/// Join/leave bookkeeping behind [`WifiPort::stats`]. Times are uptime seconds.
#[derive(Debug, Default)]
struct LinkStats {
    totals: WifiStats,
    connected_since: Option<u64>,
}

impl LinkStats {
    fn joined(&mut self, now: u64) {
        // Re-joining while associated closes the previous session.
        self.left_at(now);
        self.totals.connects += 1;
        self.connected_since = Some(now);
    }

    fn failed(&mut self) {
        self.totals.connect_failures += 1;
    }

    fn disconnected(&mut self, now: u64) {
        if self.left_at(now) {
            self.totals.disconnects += 1;
        }
    }

    fn left_at(&mut self, now: u64) -> bool {
        match self.connected_since.take() {
            Some(since) => {
                self.totals.connected_secs += now.saturating_sub(since);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self, now: u64) -> WifiStats {
        let mut stats = self.totals;
        if let Some(since) = self.connected_since {
            stats.connected_secs += now.saturating_sub(since);
        }
        stats
    }
}

#[derive(Clone)]
pub struct WifiAdapter {
    driver: Arc<Mutex<Driver>>,
    scanning: Arc<AtomicBool>,
    stats: Arc<Mutex<LinkStats>>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, WifiError> {
        let esp_wifi =
            EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| WifiError::InitFailed(e.code()))?;
        let wifi =
            BlockingWifi::wrap(esp_wifi, sysloop).map_err(|e| WifiError::InitFailed(e.code()))?;
        Ok(Self {
            driver: Arc::new(Mutex::new(Driver { wifi })),
            scanning: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(LinkStats::default())),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            driver: Arc::new(Mutex::new(Driver::default())),
            scanning: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(LinkStats::default())),
        }
    }

    fn driver(&self) -> MutexGuard<'_, Driver> {
        // A poisoned driver is still usable; the panicking caller owned the link.
        self.driver.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn link_stats(&self) -> MutexGuard<'_, LinkStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> Result<(), WifiError> {
        let mut d = self.driver();
        d.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|e| WifiError::InitFailed(e.code()))?;
        d.wifi.start().map_err(|e| WifiError::InitFailed(e.code()))?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&mut self) -> Result<(), WifiError> {
        let mut d = self.driver();
        if d.fail_init {
            return Err(WifiError::InitFailed(-1));
        }
        d.started = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, params: &ConnectParams) -> Result<IpInfo, WifiError> {
        let mut d = self.driver();
        let config = ClientConfiguration {
            ssid: params
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| WifiError::ConnectFailed(esp_idf_svc::sys::ESP_ERR_INVALID_ARG as i32))?,
            password: params
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::ConnectFailed(esp_idf_svc::sys::ESP_ERR_INVALID_ARG as i32))?,
            auth_method: auth_method(params.auth),
            ..Default::default()
        };
        d.wifi
            .set_configuration(&Configuration::Client(config))
            .map_err(|e| WifiError::ConnectFailed(e.code()))?;
        d.wifi.connect().map_err(|e| WifiError::ConnectFailed(e.code()))?;
        d.wifi
            .wait_netif_up()
            .map_err(|e| WifiError::ConnectFailed(e.code()))?;
        let ip_info = d
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(|e| WifiError::ConnectFailed(e.code()))?;
        Ok(IpInfo {
            ip: core::net::Ipv4Addr::from(ip_info.ip.octets()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, params: &ConnectParams) -> Result<IpInfo, WifiError> {
        let mut d = self.driver();
        d.connect_calls += 1;
        d.last_params = Some(params.clone());
        if !d.started {
            return Err(WifiError::ConnectFailed(-1));
        }
        if d.fail_connects > 0 {
            d.fail_connects -= 1;
            warn!("WiFi(sim): simulated connect failure for '{}'", params.ssid);
            return Err(WifiError::ConnectFailed(0x3007));
        }
        d.connected = true;
        Ok(IpInfo {
            ip: core::net::Ipv4Addr::new(192, 168, 1, 42),
        })
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) -> Result<(), WifiError> {
        self.driver()
            .wifi
            .disconnect()
            .map_err(|e| WifiError::DisconnectFailed(e.code()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) -> Result<(), WifiError> {
        let mut d = self.driver();
        d.disconnect_calls += 1;
        d.connected = false;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver().wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.driver().connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_scan(&mut self) -> Result<Vec<ScanRecord>, WifiError> {
        let aps = self
            .driver()
            .wifi
            .scan()
            .map_err(|e| WifiError::ScanFailed(e.code()))?;
        Ok(aps
            .into_iter()
            .map(|ap| {
                let mut ssid = heapless::String::new();
                let _ = ssid.push_str(ap.ssid.as_str());
                ScanRecord {
                    ssid,
                    auth: auth_type(ap.auth_method),
                    rssi: ap.signal_strength,
                    channel: ap.channel,
                    bssid: ap.bssid,
                }
            })
            .collect())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_scan(&mut self) -> Result<Vec<ScanRecord>, WifiError> {
        let d = self.driver();
        if !d.started {
            return Err(WifiError::ScanFailed(-1));
        }
        Ok(d.scan_results.clone())
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        if !self.platform_is_connected() {
            return None;
        }
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == esp_idf_svc::sys::ESP_OK as i32).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        self.driver().connected.then_some(-58)
    }
}

// ── Simulation controls ───────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn fail_init(&self) {
        self.driver().fail_init = true;
    }

    /// Make the next `n` connect calls fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.driver().fail_connects = n;
    }

    pub fn set_scan_results(&self, results: Vec<ScanRecord>) {
        self.driver().scan_results = results;
    }

    pub fn connect_calls(&self) -> u32 {
        self.driver().connect_calls
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.driver().disconnect_calls
    }

    pub fn last_params(&self) -> Option<ConnectParams> {
        self.driver().last_params.clone()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// WifiPort
// ───────────────────────────────────────────────────────────────

impl WifiPort for WifiAdapter {
    fn init(&mut self) -> Result<(), WifiError> {
        self.platform_init()?;
        info!("WiFi: station mode started, connection metrics enabled");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn disconnect(&mut self) -> Result<(), WifiError> {
        self.platform_disconnect()?;
        self.link_stats().disconnected(uptime_secs());
        info!("WiFi: disconnected");
        Ok(())
    }

    fn connect(&mut self, params: &ConnectParams) -> Result<IpInfo, WifiError> {
        info!("WiFi: connecting to '{}' ({})", params.ssid, params.auth);
        let result = self.platform_connect(params);
        let mut stats = self.link_stats();
        match result {
            Ok(_) => stats.joined(uptime_secs()),
            Err(_) => stats.failed(),
        }
        result
    }

    fn scan(&mut self) -> Result<Vec<ScanRecord>, WifiError> {
        if self.scanning.swap(true, Ordering::AcqRel) {
            return Err(WifiError::ScanInProgress);
        }
        let result = self.platform_scan();
        self.scanning.store(false, Ordering::Release);
        result
    }

    fn rssi(&self) -> Option<i8> {
        self.platform_rssi()
    }

    fn stats(&self) -> WifiStats {
        self.link_stats().snapshot(uptime_secs())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
