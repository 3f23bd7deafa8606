//! Wi-Fi diagnostics-upload demo firmware library.
//!
//! Exposes the pure-logic modules and simulation adapters for integration
//! testing. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod chunks;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod shell;
pub mod tasks;
