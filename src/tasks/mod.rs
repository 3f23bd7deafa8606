//! The two long-running tasks and the helper that starts them.
//!
//! | Task        | Core | Stack | Loop                              |
//! |-------------|------|-------|-----------------------------------|
//! | `mflt-cli`  | App  | 8 KB  | UART poll ─▶ shell                |
//! | `mflt-http` | Pro  | 20 KB | network boot, then periodic POSTs |
//!
//! On ESP-IDF a `std::thread` is a pthread on top of a FreeRTOS task, and
//! the pthread attributes for the next spawn are taken from the calling
//! thread's `esp_pthread_cfg_t`. [`spawn_on_core`] sets that config and
//! spawns back to back; nothing else may create a thread in between.

pub mod cli;
pub mod http;

use std::thread::{Builder, JoinHandle};

use embedded_hal::delay::DelayNs;
use log::info;

use crate::config::TaskConfig;

/// ESP32 CPU cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Core {
    /// PRO_CPU, shared with the Wi-Fi and lwIP tasks.
    Pro,
    /// APP_CPU.
    App,
}

impl Core {
    fn id(self) -> i32 {
        match self {
            Self::Pro => 0,
            Self::App => 1,
        }
    }
}

/// Start `f` on its own thread with the given core, priority and stack.
///
/// `name` is NUL-terminated (`"mflt-cli\0"`) because FreeRTOS keeps the
/// pointer; the Rust thread name drops the terminator.
pub fn spawn_on_core(
    core: Core,
    task: TaskConfig,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    let stack_bytes = task.stack_kb * 1024;
    let thread_name = name.trim_end_matches('\0');

    set_thread_config(core, task, name)?;
    info!(
        "Starting task '{}' (core={:?} prio={} stack={}KB)",
        thread_name, core, task.priority, task.stack_kb
    );

    Builder::new()
        .name(thread_name.to_owned())
        .stack_size(stack_bytes)
        .spawn(f)
}

#[cfg(target_os = "espidf")]
fn set_thread_config(core: Core, task: TaskConfig, name: &'static str) -> std::io::Result<()> {
    use esp_idf_svc::sys;

    // SAFETY: the config is copied by esp_pthread_set_cfg; `name` is 'static.
    let ret = unsafe {
        let mut cfg = sys::esp_pthread_get_default_config();
        cfg.pin_to_core = core.id();
        cfg.prio = i32::from(task.priority);
        cfg.stack_size = task.stack_kb * 1024;
        cfg.thread_name = name.as_ptr().cast();
        sys::esp_pthread_set_cfg(&cfg)
    };
    if ret == sys::ESP_OK as i32 {
        Ok(())
    } else {
        Err(std::io::Error::other(format!(
            "esp_pthread_set_cfg returned {ret}"
        )))
    }
}

/// Host threads ignore core affinity and priority.
#[cfg(not(target_os = "espidf"))]
fn set_thread_config(core: Core, _task: TaskConfig, _name: &'static str) -> std::io::Result<()> {
    log::debug!("sim: core {} affinity not applied", core.id());
    Ok(())
}

/// [`DelayNs`] backed by `std::thread::sleep` (a FreeRTOS delay on target).
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
