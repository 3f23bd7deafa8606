//! Application core: Wi-Fi credential handling, connect policy and the
//! demo shell commands.
//!
//! All interaction with the radio, flash and console happens through the
//! **port traits** defined in [`ports`], keeping this layer testable
//! without real peripherals.

pub mod auth;
pub mod auto_connect;
pub mod commands;
pub mod connect;
pub mod credentials;
pub mod ports;
pub mod wifi_store;
