//! Queued diagnostic data and its packetisation into upload chunks.
//!
//! Any task can [`record`](ChunkStore::record) a [`DiagRecord`]; the HTTP
//! task drains them as postcard-encoded [`Chunk`]s. A chunk is only removed
//! from the queue once it has been delivered, so a failed POST leaves the
//! data in place for the next cycle.
//!
//! ```text
//!  CLI task ──record()──▶ ┌────────────┐ ──next_chunk()──▶ HTTP task
//!  boot     ──record()──▶ │ ChunkQueue │ ◀──commit()──────
//!                         └────────────┘
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{CrashEntry, RuntimeMetrics};

/// Records held before the oldest is dropped.
pub const QUEUE_DEPTH: usize = 32;

/// Upper bound on an encoded chunk.
pub const MAX_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiagRecord {
    Log {
        level: LogLevel,
        message: heapless::String<96>,
    },
    Trace {
        reason: heapless::String<32>,
    },
    Heartbeat(RuntimeMetrics),
    Reboot {
        reason: heapless::String<32>,
    },
    Crash(CrashEntry),
}

impl DiagRecord {
    pub fn log(level: log::Level, message: &str) -> Self {
        Self::Log {
            level: level.into(),
            message: bounded(message),
        }
    }

    pub fn trace(reason: &str) -> Self {
        Self::Trace {
            reason: bounded(reason),
        }
    }

    pub fn reboot(reason: &str) -> Self {
        Self::Reboot {
            reason: bounded(reason),
        }
    }
}

fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut end = s.len().min(N);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = heapless::String::new();
    let _ = out.push_str(&s[..end]);
    out
}

/// Wire format of one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub seq: u32,
    pub records: Vec<DiagRecord>,
}

/// An encoded chunk waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChunk {
    pub seq: u32,
    /// Number of queued records it covers.
    pub records: usize,
    /// Id of the newest record it covers.
    pub last_id: u64,
    pub bytes: Vec<u8>,
}

// ───────────────────────────────────────────────────────────────
// ChunkQueue
// ───────────────────────────────────────────────────────────────

/// A queued record tagged with its enqueue order.
struct Entry {
    id: u64,
    record: DiagRecord,
}

pub struct ChunkQueue {
    records: Deque<Entry, QUEUE_DEPTH>,
    dropped: u32,
    next_seq: u32,
    next_id: u64,
}

impl ChunkQueue {
    pub const fn new() -> Self {
        Self {
            records: Deque::new(),
            dropped: 0,
            next_seq: 0,
            next_id: 0,
        }
    }

    /// Append a record, evicting the oldest one when full.
    /// Returns `false` if something was evicted.
    pub fn push(&mut self, record: DiagRecord) -> bool {
        let mut kept_all = true;
        if self.records.is_full() {
            self.records.pop_front();
            self.dropped = self.dropped.saturating_add(1);
            kept_all = false;
        }
        let id = self.next_id;
        self.next_id += 1;
        // Cannot fail: a slot was freed above if needed.
        let _ = self.records.push_back(Entry { id, record });
        kept_all
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records evicted because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Encode as many leading records as fit in [`MAX_CHUNK_SIZE`].
    ///
    /// Leaves the queue untouched except for discarding a record that can
    /// never fit on its own.
    pub fn next_chunk(&mut self) -> Option<PendingChunk> {
        loop {
            let front = self.records.front()?;
            if encoded_len(self.next_seq, core::slice::from_ref(&front.record))? > MAX_CHUNK_SIZE {
                warn!("Dropping diagnostic record larger than a chunk");
                self.records.pop_front();
                self.dropped = self.dropped.saturating_add(1);
                continue;
            }
            break;
        }

        let mut batch: Vec<DiagRecord> = Vec::new();
        let mut bytes = Vec::new();
        let mut last_id = 0;
        for entry in self.records.iter() {
            batch.push(entry.record.clone());
            let chunk = Chunk {
                seq: self.next_seq,
                records: batch,
            };
            match postcard::to_allocvec(&chunk) {
                Ok(encoded) if encoded.len() <= MAX_CHUNK_SIZE => {
                    bytes = encoded;
                    batch = chunk.records;
                    last_id = entry.id;
                }
                _ => {
                    batch = chunk.records;
                    batch.pop();
                    break;
                }
            }
        }

        Some(PendingChunk {
            seq: self.next_seq,
            records: batch.len(),
            last_id,
            bytes,
        })
    }

    /// Remove the records covered by a delivered chunk.
    ///
    /// Records pushed after the chunk was built survive, and records that
    /// were already evicted or committed elsewhere are not counted twice.
    pub fn commit(&mut self, chunk: &PendingChunk) {
        while self
            .records
            .front()
            .is_some_and(|entry| entry.id <= chunk.last_id)
        {
            self.records.pop_front();
        }
        if chunk.seq == self.next_seq {
            self.next_seq = self.next_seq.wrapping_add(1);
        }
    }
}

impl Default for ChunkQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn encoded_len(seq: u32, records: &[DiagRecord]) -> Option<usize> {
    let chunk = Chunk {
        seq,
        records: records.to_vec(),
    };
    postcard::to_allocvec(&chunk).ok().map(|v| v.len())
}

// ───────────────────────────────────────────────────────────────
// ChunkStore: cross-task handle
// ───────────────────────────────────────────────────────────────

/// A [`ChunkQueue`] behind a critical-section mutex, shareable as `&'static`.
pub struct ChunkStore {
    inner: Mutex<CriticalSectionRawMutex, RefCell<ChunkQueue>>,
}

impl ChunkStore {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ChunkQueue::new())),
        }
    }

    pub fn record(&self, record: DiagRecord) {
        let kept = self.with(|q| q.push(record));
        if !kept {
            warn!("Diagnostic queue full, oldest record dropped");
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ChunkQueue) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn len(&self) -> usize {
        self.with(|q| q.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with(|q| q.is_empty())
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide queue fed by the shell and drained by the HTTP task.
pub static CHUNKS: ChunkStore = ChunkStore::new();
