//! Pressure-pump controller firmware: main entry point.
//!
//! Hexagonal architecture driven by a cooperative multi-timer scheduler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Clock      │
//! │  (Sensor+Actuator) (EventSink)    (Storage)    (ClockPort)     │
//! │  WifiLink          EspBroker      SystemRestart                │
//! │  (LinkPort)        (Messaging)    (RestartPort)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  PumpController · RuntimeAccumulator · uptime          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · FaultEscalation (restart)       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{anyhow, Result};
use embedded_hal::delay::DelayNs;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use pumpctl::adapters::hardware::HardwareAdapter;
use pumpctl::adapters::log_sink::LogEventSink;
use pumpctl::adapters::mqtt::{self, BrokerConfig, EspBroker};
use pumpctl::adapters::nvs::{NvsAdapter, NAMESPACE};
use pumpctl::adapters::system::SystemRestart;
use pumpctl::adapters::time::{Esp32Clock, SystemDelay};
use pumpctl::adapters::wifi::WifiLink;
use pumpctl::app::device::Device;
use pumpctl::app::ports::ClockPort;
use pumpctl::app::service::AppService;
use pumpctl::comms::connectivity::ConnectivityManager;
use pumpctl::config::SystemConfig;
use pumpctl::drivers::hw_init;
use pumpctl::escalation::FaultEscalation;
use pumpctl::scheduler::Scheduler;

/// Main-loop yield so the FreeRTOS idle task can run.
const LOOP_YIELD_MS: u32 = 10;

fn load_config() -> SystemConfig {
    let config = SystemConfig::default();
    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!("Config rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  pumpctl v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware peripherals ───────────────────────────────
    hw_init::init_peripherals().map_err(|e| anyhow!("HAL init failed: {}", e))?;

    let config = load_config();

    // ── 3. Persistent storage ─────────────────────────────────
    let mut nvs = NvsAdapter::new(NAMESPACE).map_err(|e| anyhow!("NVS init failed: {}", e))?;

    // ── 4. Network adapters ───────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let wifi = BlockingWifi::wrap(EspWifi::new(peripherals.modem, sysloop.clone(), None)?, sysloop)?;

    let mut link = WifiLink::new(wifi);
    if let Err(e) = link.set_credentials(config.network.wifi_ssid, config.network.wifi_password) {
        // Pressure regulation does not depend on the uplink.
        warn!("WiFi: {} (running offline)", e);
    }

    let broker_cfg = BrokerConfig::from_network(&config.network);
    mqtt::log_target(&broker_cfg);
    let uplink = ConnectivityManager::new(link, EspBroker::new(broker_cfg), config.topics.clone());

    // ── 5. Application service ────────────────────────────────
    let mut sink = LogEventSink::new();
    let app = AppService::load(&config, &mut nvs, &mut sink);

    let mut device = Device::new(app, HardwareAdapter::default(), nvs, uplink, SystemDelay, sink);
    device.connect_now();

    // ── 6. Scheduler loop ─────────────────────────────────────
    let clock = Esp32Clock::new();
    let mut sched = Scheduler::from_config(&config, clock.ticks_ms());
    let escalation = FaultEscalation::new(config.restart_delay_ms);
    let mut restart = SystemRestart::new();
    let mut loop_delay = SystemDelay;

    info!("System ready. Entering scheduler loop ({} tasks).", sched.len());

    loop {
        if let Err(fault) = sched.poll(clock.ticks_ms(), &mut device) {
            escalation.escalate(fault, &mut loop_delay, &mut restart);
        }
        loop_delay.delay_ms(LOOP_YIELD_MS);
    }
}
