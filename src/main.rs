//! CloudPub firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  ButtonDriver      MqttCloudTransport   NvsAdapter           │
//! │  (TriggerSource)   (Transport)          (ConfigPort)         │
//! │  MonotonicClock    LogObserver + QueueObserver               │
//! │  (Clock)           (Observer)                                │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          PublisherService (pure logic)                 │  │
//! │  │  trigger intake · connectivity gate · attempt          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  WifiStation (reconnect backoff) · Watchdog                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::IOPin;
use esp_idf_svc::hal::peripherals::Peripherals;
use log::{info, warn};

use cloudpub::adapters::cloud::MqttCloudTransport;
use cloudpub::adapters::device_id::{device_id, read_mac};
use cloudpub::adapters::log_sink::LogObserver;
use cloudpub::adapters::nvs::NvsAdapter;
use cloudpub::adapters::report_queue::{self, QueueObserver, ReportTally, REPORT_CHANNEL};
use cloudpub::adapters::time::MonotonicClock;
use cloudpub::adapters::wifi::WifiStation;
use cloudpub::app::ports::{Clock, ConfigPort};
use cloudpub::app::service::PublisherService;
use cloudpub::config::SystemConfig;
use cloudpub::drivers::button::ButtonDriver;
use cloudpub::drivers::watchdog::Watchdog;

/// How often the publish loop logs its running report summary.
const SUMMARY_PERIOD_MS: u32 = 60_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CloudPub v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let clock = MonotonicClock::new();

    let mut wifi = WifiStation::start(
        peripherals.modem,
        sysloop,
        None,
        &config.cloud,
        clock.now_ms(),
    )?;

    let dev_id = device_id(&read_mac());
    info!("Device ID: {}", dev_id);
    let mut transport = MqttCloudTransport::start(&config.cloud, &dev_id)?;

    // ── 4. Trigger source + publisher ─────────────────────────
    let mut button = ButtonDriver::attach(peripherals.pins.gpio0.downgrade(), config.button_debounce_ms)?;
    let mut service = PublisherService::with_trigger_source(config.publisher.clone(), &mut button)?;

    let mut observers = (LogObserver::new(), QueueObserver::new(&REPORT_CHANNEL));
    let mut tally = ReportTally::default();
    let mut last_summary_at = clock.now_ms();

    let watchdog = Watchdog::new(config.watchdog_timeout_ms());
    let poll_interval = Duration::from_millis(u64::from(config.poll_interval_ms));

    info!("System ready. Entering publish loop.");

    // ── 5. Publish loop ───────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();
        wifi.supervise(now_ms);

        if let Err(e) = service.poll(now_ms, &mut transport, &mut observers) {
            warn!("publish loop: {}", e);
        }

        report_queue::drain(&REPORT_CHANNEL, |r| tally.record(&r));
        if now_ms.wrapping_sub(last_summary_at) >= SUMMARY_PERIOD_MS {
            info!("SUMMARY | {} dropped={}", tally, observers.1.dropped());
            last_summary_at = now_ms;
        }

        watchdog.feed();
        button.rearm();
        std::thread::sleep(poll_interval);
    }
}
