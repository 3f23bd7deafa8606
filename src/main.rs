//! Wi-Fi diagnostics-upload demo firmware: entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │   NvsAdapter    WifiAdapter    UartAdapter    HttpChunkClient│
//! │   (KvStore)     (Wifi)         (Console)      (ChunkTransport)│
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │   mflt-cli  (App core):  CliTask ─▶ Shell ─▶ AppCommands     │
//! │   mflt-http (Pro core):  HttpTask ─▶ auto-connect, uploads   │
//! │                     shared: CHUNKS queue                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use mflt_demo::adapters::device_id::DeviceInfo;
use mflt_demo::adapters::http_client::HttpChunkClient;
use mflt_demo::adapters::nvs::NvsAdapter;
use mflt_demo::adapters::uart::UartAdapter;
use mflt_demo::adapters::wifi::WifiAdapter;
use mflt_demo::app::commands::AppCommands;
use mflt_demo::chunks::CHUNKS;
use mflt_demo::config::{BuildConfig, ConsoleConfig, TaskConfig};
use mflt_demo::diagnostics;
use mflt_demo::error::Error;
use mflt_demo::tasks::cli::CliTask;
use mflt_demo::tasks::http::HttpTask;
use mflt_demo::tasks::{spawn_on_core, Core};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  mflt-wifi-demo v{}               ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 3. Storage + crash capture ────────────────────────────
    let kv = NvsAdapter::new(nvs_partition.clone()).map_err(Error::from)?;
    diagnostics::install_panic_handler(kv.clone());

    let device = DeviceInfo::read();
    info!(
        "Device S/N {} ({} {} / {})",
        device.device_serial, device.software_type, device.software_version, device.hardware_version
    );

    let build = BuildConfig::from_env();

    let wifi = WifiAdapter::new(peripherals.modem, sysloop, Some(nvs_partition))
        .map_err(Error::from)?;

    let console_cfg = ConsoleConfig::default();
    let uart = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio1,
        peripherals.pins.gpio3,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(console_cfg.baudrate)),
    )?;

    // ── 4. Tasks ──────────────────────────────────────────────
    let commands = AppCommands::new(kv.clone(), wifi.clone(), FreeRtos, &CHUNKS, device.clone());
    let cli = CliTask::new(UartAdapter::new(uart), commands, FreeRtos, console_cfg);
    let cli_handle = spawn_on_core(Core::App, TaskConfig::CLI, "mflt-cli\0", move || cli.run())?;

    let http_handle = spawn_on_core(Core::Pro, TaskConfig::HTTP, "mflt-http\0", move || {
        let transport = HttpChunkClient::new(&device.device_serial, build.project_key);
        HttpTask::new(kv, wifi, transport, FreeRtos, build, &CHUNKS).run()
    })?;

    info!("System ready.");

    for (name, handle) in [("mflt-cli", cli_handle), ("mflt-http", http_handle)] {
        if handle.join().is_err() {
            error!("Task '{}' exited", name);
        }
    }
    Ok(())
}
