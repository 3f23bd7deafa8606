//! Demo shell commands.
//!
//! [`AppCommands`] binds the command table to the Wi-Fi driver, the KV
//! store and the diagnostic queue. It is generic over the ports so the
//! host tests drive it with simulated adapters.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::adapters::device_id::DeviceInfo;
use crate::app::auth::AuthType;
use crate::app::connect::{connect_to_ap, scan_aps, ScanEvent, ScanLine, SCAN_END_MARKER};
use crate::app::ports::{KvStorePort, WifiPort};
use crate::app::wifi_store::{clear_wifi_config, save_wifi_config};
use crate::chunks::{ChunkQueue, ChunkStore, DiagRecord};
use crate::config::RetryPolicy;
use crate::diagnostics::{CrashLog, RuntimeMetrics};
use crate::error::{CommandError, WifiError};
use crate::shell::{CommandSet, CommandSpec};

const WIFI_JOIN_USAGE: &str = "wifi_join <ssid> <auth_type> [password]";
const WIFI_SAVE_USAGE: &str = "wifi_save <ssid> <auth_type> [password]";

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "wifi_join",
        help: "Join a Wi-Fi AP: <ssid> <auth_type> [password]",
    },
    CommandSpec {
        name: "wifi_save",
        help: "Save Wi-Fi config used at boot: <ssid> <auth_type> [password]",
    },
    CommandSpec {
        name: "wifi_scan",
        help: "Scan for nearby Wi-Fi APs",
    },
    CommandSpec {
        name: "wifi_clear",
        help: "Erase the saved Wi-Fi config",
    },
    CommandSpec {
        name: "get_device_info",
        help: "Display device information",
    },
    CommandSpec {
        name: "get_core",
        help: "Show the stored crash entries",
    },
    CommandSpec {
        name: "clear_core",
        help: "Erase the stored crash entries",
    },
    CommandSpec {
        name: "export",
        help: "Print queued diagnostic chunks to the console",
    },
    CommandSpec {
        name: "test_log",
        help: "Write logs at every level",
    },
    CommandSpec {
        name: "test_trace",
        help: "Capture a trace event",
    },
    CommandSpec {
        name: "test_heartbeat",
        help: "Capture a heartbeat with current metrics",
    },
    CommandSpec {
        name: "test_assert",
        help: "Trigger an assert (crash)",
    },
    CommandSpec {
        name: "test_reboot",
        help: "Force a system reboot",
    },
];

/// Password argument, empty when omitted.
fn wifi_args<'a>(
    args: &[&'a str],
    usage: &'static str,
) -> Result<(&'a str, &'a str, &'a str), CommandError> {
    match *args {
        [ssid, auth] => Ok((ssid, auth, "")),
        [ssid, auth, password] => Ok((ssid, auth, password)),
        _ => Err(CommandError::Usage(usage)),
    }
}

pub struct AppCommands<K, W, D> {
    kv: K,
    wifi: W,
    delay: D,
    store: &'static ChunkStore,
    device: DeviceInfo,
    restart: fn(),
}

impl<K, W, D> AppCommands<K, W, D>
where
    K: KvStorePort,
    W: WifiPort,
    D: DelayNs,
{
    pub fn new(kv: K, wifi: W, delay: D, store: &'static ChunkStore, device: DeviceInfo) -> Self {
        Self {
            kv,
            wifi,
            delay,
            store,
            device,
            restart: crate::diagnostics::restart,
        }
    }

    /// Replace the reboot hook used by `test_reboot`.
    pub fn with_restart(mut self, restart: fn()) -> Self {
        self.restart = restart;
        self
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    fn wifi_join(&mut self, args: &[&str], out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        let (ssid, auth, password) = wifi_args(args, WIFI_JOIN_USAGE)?;
        let ip = connect_to_ap(
            &mut self.wifi,
            &mut self.delay,
            ssid,
            auth,
            password,
            RetryPolicy::INTERACTIVE,
        )?;
        writeln!(out, "Connected to '{}', IP {}", ssid, ip.ip)?;
        Ok(())
    }

    fn wifi_save(&mut self, args: &[&str], out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        let (ssid, auth, password) = wifi_args(args, WIFI_SAVE_USAGE)?;
        if !AuthType::parse(auth).is_supported() {
            return Err(WifiError::UnsupportedAuth.into());
        }
        save_wifi_config(&mut self.kv, ssid, auth, password)?;
        writeln!(out, "Saved Wi-Fi config for '{}'", ssid)?;
        Ok(())
    }

    fn wifi_scan(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        writeln!(
            out,
            "{:<20} {:<14} {:<10} {:<7} {}",
            "SSID", "Security", "RSSI(dBm)", "Channel", "BSSID"
        )?;
        let mut write_result = Ok(());
        let found = scan_aps(&mut self.wifi, |event| {
            let r = match event {
                ScanEvent::Result(record) => writeln!(out, "{}", ScanLine(record)),
                ScanEvent::Complete => writeln!(out, "{}", SCAN_END_MARKER),
            };
            if write_result.is_ok() {
                write_result = r;
            }
        })?;
        write_result?;
        debug!("wifi_scan: {} APs", found);
        Ok(())
    }

    fn wifi_clear(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        clear_wifi_config(&mut self.kv)?;
        writeln!(out, "Saved Wi-Fi config erased")?;
        Ok(())
    }

    fn get_device_info(&self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        let d = &self.device;
        writeln!(out, "S/N: {}", d.device_serial)?;
        writeln!(out, "SW type: {}", d.software_type)?;
        writeln!(out, "SW version: {}", d.software_version)?;
        writeln!(out, "HW version: {}", d.hardware_version)?;
        Ok(())
    }

    fn get_core(&self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        let mut log = CrashLog::new();
        log.init(&self.kv);
        let count = log.count(&self.kv);
        if count == 0 {
            writeln!(out, "No crash entries stored")?;
            return Ok(());
        }
        writeln!(out, "{} crash entries stored", count)?;
        if let Some(latest) = log.latest(&self.kv) {
            writeln!(
                out,
                "Latest: uptime={}s pc=0x{:08x} reason=\"{}\"",
                latest.uptime_secs, latest.pc, latest.reason
            )?;
        }
        Ok(())
    }

    fn clear_core(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        let mut log = CrashLog::new();
        log.init(&self.kv);
        log.clear(&mut self.kv);
        writeln!(out, "Crash entries erased")?;
        Ok(())
    }

    fn export(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        while let Some(chunk) = self.store.with(ChunkQueue::next_chunk) {
            write!(out, "MC:")?;
            for b in &chunk.bytes {
                write!(out, "{:02X}", b)?;
            }
            writeln!(out, ":")?;
            self.store.with(|q| q.commit(&chunk));
        }
        Ok(())
    }

    fn test_log(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        let levels = [
            (log::Level::Debug, "Debug log!"),
            (log::Level::Info, "Info log!"),
            (log::Level::Warn, "Warning log!"),
            (log::Level::Error, "Error log!"),
        ];
        for (level, message) in levels {
            log::log!(level, "{}", message);
            self.store.record(DiagRecord::log(level, message));
        }
        writeln!(out, "Logged at every level")?;
        Ok(())
    }

    fn test_trace(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        self.store.record(DiagRecord::trace("test_trace"));
        info!("Trace event captured");
        writeln!(out, "Trace event captured")?;
        Ok(())
    }

    fn test_heartbeat(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        let metrics = RuntimeMetrics::collect(self.wifi.rssi(), self.wifi.stats(), self.store);
        writeln!(
            out,
            "Heartbeat: uptime={}s heap_free={} rssi={} wifi_connects={} wifi_failures={} wifi_disconnects={}",
            metrics.uptime_secs,
            metrics.heap_free,
            metrics.wifi_rssi,
            metrics.wifi.connects,
            metrics.wifi.connect_failures,
            metrics.wifi.disconnects,
        )?;
        self.store.record(DiagRecord::Heartbeat(metrics));
        Ok(())
    }

    fn test_assert(&mut self) -> Result<(), CommandError> {
        error!("test_assert: triggering assert");
        panic!("test_assert");
    }

    fn test_reboot(&mut self, out: &mut dyn fmt::Write) -> Result<(), CommandError> {
        warn!("test_reboot: rebooting");
        self.store.record(DiagRecord::reboot("test_reboot"));
        writeln!(out, "Rebooting...")?;
        (self.restart)();
        Ok(())
    }
}

impl<K, W, D> CommandSet for AppCommands<K, W, D>
where
    K: KvStorePort,
    W: WifiPort,
    D: DelayNs,
{
    fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    fn execute(
        &mut self,
        name: &str,
        args: &[&str],
        out: &mut dyn fmt::Write,
    ) -> Result<(), CommandError> {
        match name {
            "wifi_join" => self.wifi_join(args, out),
            "wifi_save" => self.wifi_save(args, out),
            "wifi_scan" => self.wifi_scan(out),
            "wifi_clear" => self.wifi_clear(out),
            "get_device_info" => self.get_device_info(out),
            "get_core" => self.get_core(out),
            "clear_core" => self.clear_core(out),
            "export" => self.export(out),
            "test_log" => self.test_log(out),
            "test_trace" => self.test_trace(out),
            "test_heartbeat" => self.test_heartbeat(out),
            "test_assert" => self.test_assert(),
            "test_reboot" => self.test_reboot(out),
            _ => Err(CommandError::Usage("help")),
        }
    }
}
