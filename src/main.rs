//! FlowWatch Firmware: Main Entry Point
//!
//! ```text
//!  GPIO ISR (rising edge) ──▶ FLOW_PULSES (critical section)
//!                                    │
//!  ───────────────── Port Trait Boundary ─────────────────
//!                                    ▼
//!  WifiLink ─────▶ ┌──────────────────────────────┐ ──▶ LogEventSink
//!  HttpListener ─▶ │ StatusServer                 │
//!  MonotonicClock ▶│ CheckLink → Poll → Serve     │ ──▶ TcpConnection
//!                  └──────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use flowwatch::adapters::http_listener::HttpListener;
use flowwatch::adapters::log_sink::LogEventSink;
use flowwatch::adapters::time::MonotonicClock;
use flowwatch::adapters::wifi::WifiLink;
use flowwatch::app::service::StatusServer;
use flowwatch::config::SystemConfig;
use flowwatch::drivers::{hw_init, watchdog::Watchdog};
use flowwatch::error;
use flowwatch::sensors::flow::FLOW_PULSES;

/// Delay between initial association attempts.
const INITIAL_CONNECT_RETRY_MS: u32 = 500;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    // ── 2. Config (compiled-in defaults + optional override) ──
    let config = load_config().context("invalid FLOWWATCH_CONFIG")?;
    if let Some(level) = config.level_filter() {
        log::set_max_level(level);
    }
    info!("FlowWatch v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 3. Flow sensor input + ISR ────────────────────────────
    hw_init::init_flow_sensor().context("flow sensor bring-up")?;

    // ── 4. WiFi station ───────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?, sysloop)?;

    let link = bring_up_link(wifi).context("WiFi bring-up")?;

    // ── 5. HTTP listener ──────────────────────────────────────
    let listener = HttpListener::bind(config.http_port).context("HTTP listener bind")?;

    // ── 6. Status loop ────────────────────────────────────────
    let sink = config.diagnostics.then(LogEventSink::new);
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let mut server = StatusServer::new(
        &config,
        &FLOW_PULSES,
        link,
        listener,
        MonotonicClock::new(),
        sink,
    );

    info!("System ready. Entering status loop.");
    server.start();
    server.run(|_| watchdog.feed())
}

/// Compiled-in defaults plus the optional `FLOWWATCH_CONFIG` override.
fn load_config() -> error::Result<SystemConfig> {
    Ok(SystemConfig::load(option_env!("FLOWWATCH_CONFIG"))?)
}

/// Validate the build-time credentials, then retry association until the
/// interface has an address.
fn bring_up_link(wifi: BlockingWifi<EspWifi<'static>>) -> error::Result<WifiLink> {
    let mut link = WifiLink::new(
        wifi,
        option_env!("WIFI_SSID").unwrap_or_default(),
        option_env!("WIFI_PASSWORD").unwrap_or_default(),
    )?;
    while let Err(e) = link.connect() {
        warn!("WiFi: initial connect to '{}' failed ({}), retrying", link.ssid(), e);
        FreeRtos::delay_ms(INITIAL_CONNECT_RETRY_MS);
    }
    Ok(link)
}
