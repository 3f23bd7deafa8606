//! Mock adapters for integration tests.
//!
//! Each mock records every call so tests can assert on the full
//! interaction history without touching a radio or flash.

use std::collections::HashMap;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use mflt_demo::app::credentials::ConnectParams;
use mflt_demo::app::ports::{IpInfo, KvStorePort, ScanRecord, WifiPort, WifiStats};
use mflt_demo::error::{KvError, WifiError};

// ── Wi-Fi ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiCall {
    Init,
    Disconnect,
    Connect(String),
    Scan,
}

pub struct MockWifi {
    pub calls: Vec<WifiCall>,
    pub connected: bool,
    /// Result of each upcoming connect; `Ok` once exhausted.
    pub connect_results: VecDeque<Result<(), WifiError>>,
    pub scan_result: Result<Vec<ScanRecord>, WifiError>,
    pub stats: WifiStats,
}

#[allow(dead_code)]
impl MockWifi {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            connected: false,
            connect_results: VecDeque::new(),
            scan_result: Ok(Vec::new()),
            stats: WifiStats::default(),
        }
    }

    pub fn failing(n: usize, code: i32) -> Self {
        let mut w = Self::new();
        for _ in 0..n {
            w.connect_results.push_back(Err(WifiError::ConnectFailed(code)));
        }
        w
    }

    pub fn connect_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, WifiCall::Connect(_)))
            .count()
    }

    pub fn connected_ssids(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                WifiCall::Connect(ssid) => Some(ssid.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockWifi {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiPort for MockWifi {
    fn init(&mut self) -> Result<(), WifiError> {
        self.calls.push(WifiCall::Init);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> Result<(), WifiError> {
        self.calls.push(WifiCall::Disconnect);
        if self.connected {
            self.stats.disconnects += 1;
        }
        self.connected = false;
        Ok(())
    }

    fn connect(&mut self, params: &ConnectParams) -> Result<IpInfo, WifiError> {
        self.calls.push(WifiCall::Connect(params.ssid.to_string()));
        if let Err(e) = self.connect_results.pop_front().unwrap_or(Ok(())) {
            self.stats.connect_failures += 1;
            return Err(e);
        }
        self.stats.connects += 1;
        self.connected = true;
        Ok(IpInfo {
            ip: core::net::Ipv4Addr::new(10, 0, 0, 7),
        })
    }

    fn scan(&mut self) -> Result<Vec<ScanRecord>, WifiError> {
        self.calls.push(WifiCall::Scan);
        self.scan_result.clone()
    }

    fn rssi(&self) -> Option<i8> {
        self.connected.then_some(-50)
    }

    fn stats(&self) -> WifiStats {
        self.stats
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Records every requested wait instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub waits_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}

// ── KV store ──────────────────────────────────────────────────

/// In-memory KV with per-key read failure injection.
#[derive(Default)]
pub struct MockKv {
    pub data: HashMap<(String, String), Vec<u8>>,
    pub failing_reads: Vec<String>,
}

#[allow(dead_code)]
impl MockKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, ns: &str, key: &str, value: &[u8]) {
        self.data.insert((ns.into(), key.into()), value.to_vec());
    }

    pub fn keys_in(&self, ns: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .data
            .keys()
            .filter(|(n, _)| n == ns)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl KvStorePort for MockKv {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, KvError> {
        if self.failing_reads.iter().any(|k| k == key) {
            return Err(KvError::Io(-1));
        }
        let value = self
            .data
            .get(&(namespace.to_string(), key.to_string()))
            .ok_or(KvError::NotFound)?;
        if value.len() > buf.len() {
            return Err(KvError::TooLarge);
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), KvError> {
        self.put(namespace, key, data);
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), KvError> {
        self.data.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.data
            .contains_key(&(namespace.to_string(), key.to_string()))
    }
}
