//! Crash capture and runtime metrics.
//!
//! Keeps up to 4 crash entries in a KV ring buffer under the "crash"
//! namespace. The panic hook writes an entry before the device resets;
//! at the next boot unreported entries are queued for upload and stay
//! readable through the `get_core` shell command until `clear_core`.

use std::sync::Mutex;

use log::error;
use serde::{Deserialize, Serialize};

use crate::app::ports::{KvStorePort, WifiStats};
use crate::chunks::{ChunkStore, DiagRecord};

pub const CRASH_RING_SLOTS: usize = 4;
const CRASH_NAMESPACE: &str = "crash";
const CRASH_INDEX_KEY: &str = "crash_idx";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashEntry {
    pub uptime_secs: u64,
    pub reason: heapless::String<64>,
    pub pc: u32,
    pub backtrace: heapless::Vec<u32, 8>,
    /// Set once the entry has been queued for upload.
    pub reported: bool,
}

impl CrashEntry {
    pub fn new(uptime_secs: u64, reason: &str, pc: u32) -> Self {
        let mut end = reason.len().min(63);
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        let mut r = heapless::String::new();
        let _ = r.push_str(&reason[..end]);
        Self {
            uptime_secs,
            reason: r,
            pc,
            backtrace: heapless::Vec::new(),
            reported: false,
        }
    }
}

/// KV-backed ring buffer for crash entries.
#[derive(Default)]
pub struct CrashLog {
    write_index: usize,
}

impl CrashLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the write index from the store, or default to 0.
    pub fn init<K: KvStorePort + ?Sized>(&mut self, kv: &K) {
        let mut buf = [0u8; 4];
        if let Ok(4) = kv.read(CRASH_NAMESPACE, CRASH_INDEX_KEY, &mut buf) {
            self.write_index = u32::from_le_bytes(buf) as usize % CRASH_RING_SLOTS;
        }
    }

    /// Write a crash entry to the next ring slot and advance the index.
    pub fn write_entry<K: KvStorePort + ?Sized>(&mut self, kv: &mut K, entry: &CrashEntry) {
        let slot_key = Self::slot_key(self.write_index);
        if let Ok(bytes) = postcard::to_allocvec(entry) {
            let _ = kv.write(CRASH_NAMESPACE, &slot_key, &bytes);
        }

        self.write_index = (self.write_index + 1) % CRASH_RING_SLOTS;
        let idx_bytes = (self.write_index as u32).to_le_bytes();
        let _ = kv.write(CRASH_NAMESPACE, CRASH_INDEX_KEY, &idx_bytes);
    }

    /// Stored entries, oldest first.
    pub fn read_all<K: KvStorePort + ?Sized>(&self, kv: &K) -> heapless::Vec<CrashEntry, 4> {
        let mut entries = heapless::Vec::new();
        for offset in 0..CRASH_RING_SLOTS {
            let slot = (self.write_index + offset) % CRASH_RING_SLOTS;
            if let Some(entry) = Self::read_slot(kv, slot) {
                let _ = entries.push(entry);
            }
        }
        entries
    }

    /// Most recently written entry.
    pub fn latest<K: KvStorePort + ?Sized>(&self, kv: &K) -> Option<CrashEntry> {
        self.read_all(kv).last().cloned()
    }

    /// Return entries not yet queued for upload and mark them reported.
    pub fn take_unreported<K: KvStorePort + ?Sized>(&self, kv: &mut K) -> Vec<CrashEntry> {
        let mut fresh = Vec::new();
        for offset in 0..CRASH_RING_SLOTS {
            let slot = (self.write_index + offset) % CRASH_RING_SLOTS;
            let Some(mut entry) = Self::read_slot(kv, slot) else {
                continue;
            };
            if entry.reported {
                continue;
            }
            fresh.push(entry.clone());
            entry.reported = true;
            if let Ok(bytes) = postcard::to_allocvec(&entry) {
                let _ = kv.write(CRASH_NAMESPACE, &Self::slot_key(slot), &bytes);
            }
        }
        fresh
    }

    /// Erase all crash entries and reset the index.
    pub fn clear<K: KvStorePort + ?Sized>(&mut self, kv: &mut K) {
        for i in 0..CRASH_RING_SLOTS {
            let _ = kv.delete(CRASH_NAMESPACE, &Self::slot_key(i));
        }
        let _ = kv.delete(CRASH_NAMESPACE, CRASH_INDEX_KEY);
        self.write_index = 0;
    }

    pub fn count<K: KvStorePort + ?Sized>(&self, kv: &K) -> usize {
        (0..CRASH_RING_SLOTS)
            .filter(|i| kv.exists(CRASH_NAMESPACE, &Self::slot_key(*i)))
            .count()
    }

    fn read_slot<K: KvStorePort + ?Sized>(kv: &K, slot: usize) -> Option<CrashEntry> {
        let mut buf = [0u8; 256];
        let len = kv.read(CRASH_NAMESPACE, &Self::slot_key(slot), &mut buf).ok()?;
        postcard::from_bytes::<CrashEntry>(&buf[..len]).ok()
    }

    fn slot_key(index: usize) -> heapless::String<16> {
        let mut s = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut s, format_args!("e{}", index));
        s
    }
}

/// Move crash entries captured before the last reset into the upload queue.
pub fn queue_unreported_crashes<K: KvStorePort + ?Sized>(kv: &mut K, store: &ChunkStore) -> usize {
    let mut log = CrashLog::new();
    log.init(kv);
    let fresh = log.take_unreported(kv);
    let n = fresh.len();
    for entry in fresh {
        store.record(DiagRecord::Crash(entry));
    }
    n
}

// ───────────────────────────────────────────────────────────────
// Runtime metrics
// ───────────────────────────────────────────────────────────────

/// Heartbeat snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub heap_free: u32,
    pub heap_min_free: u32,
    /// 0 when not associated.
    pub wifi_rssi: i8,
    pub wifi: WifiStats,
    pub queued_records: u32,
    pub dropped_records: u32,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect(wifi_rssi: Option<i8>, wifi: WifiStats, store: &ChunkStore) -> Self {
        use esp_idf_svc::sys::{esp_get_free_heap_size, esp_get_minimum_free_heap_size};
        let heap_free = unsafe { esp_get_free_heap_size() };
        let heap_min_free = unsafe { esp_get_minimum_free_heap_size() };
        let (queued, dropped) = store.with(|q| (q.len() as u32, q.dropped()));
        Self {
            uptime_secs: uptime_secs(),
            heap_free,
            heap_min_free,
            wifi_rssi: wifi_rssi.unwrap_or(0),
            wifi,
            queued_records: queued,
            dropped_records: dropped,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(wifi_rssi: Option<i8>, wifi: WifiStats, store: &ChunkStore) -> Self {
        // Synthetic heap figures so simulation exercises the same paths.
        let uptime = uptime_secs();
        let heap_free = 307_200_u32.saturating_sub((uptime / 60) as u32 * 512);
        let (queued, dropped) = store.with(|q| (q.len() as u32, q.dropped()));
        Self {
            uptime_secs: uptime,
            heap_free,
            heap_min_free: (heap_free as f32 * 0.85) as u32,
            wifi_rssi: wifi_rssi.unwrap_or(0),
            wifi,
            queued_records: queued,
            dropped_records: dropped,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Platform hooks
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn uptime_secs() -> u64 {
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000
}

#[cfg(not(target_os = "espidf"))]
pub fn uptime_secs() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs()
}

/// Reboot the MCU.
#[cfg(target_os = "espidf")]
pub fn restart() {
    esp_idf_svc::hal::reset::restart();
}

#[cfg(not(target_os = "espidf"))]
pub fn restart() {
    log::warn!("restart(sim): ignored");
}

/// Unrecoverable bring-up failure: log and panic so the hook records it.
pub fn fatal(reason: &str) -> ! {
    error!("FATAL: {}", reason);
    panic!("{}", reason);
}

/// Install a panic hook that persists a [`CrashEntry`] through `kv`.
///
/// Must be called once during init, after the KV store is ready.
pub fn install_panic_handler<K>(kv: K)
where
    K: KvStorePort + Send + 'static,
{
    let kv = Mutex::new(kv);
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };

        error!("PANIC: {}", reason);

        let entry = CrashEntry::new(uptime_secs(), reason, 0);
        match kv.try_lock() {
            Ok(mut kv) => {
                let mut crash_log = CrashLog::new();
                crash_log.init(&*kv);
                crash_log.write_entry(&mut *kv, &entry);
            }
            Err(_) => error!("Panic handler: KV store busy, crash entry not persisted"),
        }
    }));
}
