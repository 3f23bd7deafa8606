//! Port traits: the boundary between the demo logic and the vendor stack.
//!
//! ```text
//!   Adapter (esp-idf / simulation) ──▶ Port trait ──▶ app / tasks
//! ```
//!
//! Adapters in [`crate::adapters`] implement these for ESP-IDF and for the
//! host simulation. Waits go through [`embedded_hal::delay::DelayNs`] so the
//! retry and polling loops can be driven by a recording mock in tests.

use core::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::app::auth::AuthType;
use crate::app::credentials::ConnectParams;
use crate::error::{ConsoleError, KvError, UploadError, WifiError};

// ───────────────────────────────────────────────────────────────
// Key-value store
// ───────────────────────────────────────────────────────────────

/// Flash-backed key-value storage.
///
/// Keys are namespaced so the Wi-Fi config and the crash ring cannot
/// collide. Writes are atomic per key.
pub trait KvStorePort {
    /// Read a value into `buf`, returning the number of bytes written.
    /// A stored value larger than `buf` is [`KvError::TooLarge`].
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, KvError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), KvError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), KvError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Wi-Fi
// ───────────────────────────────────────────────────────────────

/// Address assigned after a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpInfo {
    pub ip: Ipv4Addr,
}

/// One access point seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub ssid: heapless::String<32>,
    pub auth: AuthType,
    pub rssi: i8,
    pub channel: u8,
    pub bssid: [u8; 6],
}

/// Connection counters kept by the driver since `init`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiStats {
    pub connects: u32,
    pub connect_failures: u32,
    pub disconnects: u32,
    /// Time spent associated, including the current session.
    pub connected_secs: u64,
}

/// Station-mode Wi-Fi driver.
///
/// The driver is process-global: whichever task calls `connect` or
/// `disconnect` last determines the link state.
pub trait WifiPort {
    /// Bring up the driver in station mode.
    fn init(&mut self) -> Result<(), WifiError>;

    /// True while associated with an AP.
    fn is_connected(&self) -> bool;

    fn disconnect(&mut self) -> Result<(), WifiError>;

    /// Associate and wait for an address.
    fn connect(&mut self, params: &ConnectParams) -> Result<IpInfo, WifiError>;

    /// Blocking scan of nearby APs.
    fn scan(&mut self) -> Result<Vec<ScanRecord>, WifiError>;

    /// Signal strength of the current AP.
    fn rssi(&self) -> Option<i8>;

    fn stats(&self) -> WifiStats;
}

// ───────────────────────────────────────────────────────────────
// Console
// ───────────────────────────────────────────────────────────────

/// Byte-oriented serial console.
pub trait ConsolePort {
    /// Number of bytes waiting in the receive FIFO.
    fn readable(&mut self) -> usize;

    /// Read one byte, waiting at most `timeout_ms`.
    fn read_byte(&mut self, timeout_ms: u32) -> Result<u8, ConsoleError>;

    /// Blocking write; output errors are dropped like on a UART retarget.
    fn write_bytes(&mut self, data: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Chunk upload
// ───────────────────────────────────────────────────────────────

/// Outbound channel for diagnostic chunks.
pub trait ChunkTransport {
    /// Set up sockets and TLS trust anchors.
    fn init(&mut self) -> Result<(), UploadError>;

    /// POST a single chunk; `Ok` only for a 2xx response.
    fn post_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError>;
}
