//! UART console adapter.
//!
//! Implements [`ConsolePort`] on ESP-IDF with `esp_idf_hal::uart::UartDriver`.
//! The host build is an in-memory line whose receive side is fed by tests
//! and whose transmit side is captured for assertions.

use crate::app::ports::ConsolePort;
use crate::error::ConsoleError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::{delay::TickType, uart::UartDriver};

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;
#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(target_os = "espidf")]
pub struct UartAdapter {
    uart: UartDriver<'static>,
}

#[cfg(target_os = "espidf")]
impl UartAdapter {
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self { uart }
    }
}

#[cfg(target_os = "espidf")]
impl ConsolePort for UartAdapter {
    fn readable(&mut self) -> usize {
        self.uart.remaining_read().unwrap_or(0)
    }

    fn read_byte(&mut self, timeout_ms: u32) -> Result<u8, ConsoleError> {
        let mut byte = [0u8; 1];
        let ticks = TickType::from(core::time::Duration::from_millis(u64::from(timeout_ms)));
        match self.uart.read(&mut byte, ticks.into()) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(ConsoleError::Timeout),
            Err(e) => Err(ConsoleError::Io(e.code())),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) {
        let mut rest = data;
        while !rest.is_empty() {
            match self.uart.write(rest) {
                Ok(0) | Err(_) => break,
                Ok(n) => rest = &rest[n..],
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct Line {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    /// Upcoming reads that fail.
    read_errors: u32,
}

/// In-memory console. Clones share the same line.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Default)]
pub struct UartAdapter {
    line: Arc<Mutex<Line>>,
}

#[cfg(not(target_os = "espidf"))]
impl UartAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self) -> MutexGuard<'_, Line> {
        self.line.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue bytes as if typed on the terminal.
    pub fn feed(&self, bytes: &[u8]) {
        self.line().rx.extend(bytes.iter().copied());
    }

    /// Make the next `n` reads fail with an I/O error.
    pub fn fail_next_reads(&self, n: u32) {
        self.line().read_errors = n;
    }

    /// Drain everything written so far.
    pub fn take_output(&self) -> String {
        let tx = core::mem::take(&mut self.line().tx);
        String::from_utf8_lossy(&tx).into_owned()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ConsolePort for UartAdapter {
    fn readable(&mut self) -> usize {
        self.line().rx.len()
    }

    fn read_byte(&mut self, _timeout_ms: u32) -> Result<u8, ConsoleError> {
        let mut line = self.line();
        if line.read_errors > 0 {
            line.read_errors -= 1;
            return Err(ConsoleError::Io(-1));
        }
        line.rx.pop_front().ok_or(ConsoleError::Timeout)
    }

    fn write_bytes(&mut self, data: &[u8]) {
        self.line().tx.extend_from_slice(data);
    }
}
