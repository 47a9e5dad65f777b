//! Mock adapters for integration tests.
//!
//! `MockHardware` scripts ADC readings and records every relay write so
//! tests can assert on the full command history without touching the
//! process-wide simulated GPIO in `drivers::hw_init`.

use std::collections::{HashMap, VecDeque};

use embedded_hal::delay::DelayNs;
use pumpctl::adapters::mqtt::{BrokerConfig, LoopbackBroker};
use pumpctl::adapters::wifi::WifiLink;
use pumpctl::app::events::AppEvent;
use pumpctl::app::ports::{ActuatorPort, EventSink, SensorPort, StorageError, StoragePort};
use pumpctl::comms::connectivity::ConnectivityManager;
use pumpctl::config::{NetworkConfig, SystemConfig};
use pumpctl::error::{ActuatorError, SensorError};

/// Raw ADC count that converts to `bar` with the default calibration.
pub fn raw_for(bar: f32) -> u16 {
    let cfg = SystemConfig::default();
    ((bar / cfg.bar_per_volt + cfg.zero_offset_volts) / cfg.volts_per_count).round() as u16
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Returned once `script` is empty.
    pub raw: u16,
    pub script: VecDeque<u16>,
    pub relay: bool,
    pub relay_writes: Vec<bool>,
    /// Next ADC read fails with this code.
    pub fail_read: Option<i32>,
    /// Every relay write fails with this code.
    pub fail_relay: Option<i32>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn at_pressure(bar: f32) -> Self {
        Self {
            raw: raw_for(bar),
            script: VecDeque::new(),
            relay: false,
            relay_writes: Vec::new(),
            fail_read: None,
            fail_relay: None,
        }
    }

    pub fn set_pressure(&mut self, bar: f32) {
        self.raw = raw_for(bar);
    }

    /// Number of OFF→ON edges in the write history.
    pub fn starts(&self) -> usize {
        let mut prev = false;
        let mut n = 0;
        for &w in &self.relay_writes {
            if w && !prev {
                n += 1;
            }
            prev = w;
        }
        n
    }
}

impl SensorPort for MockHardware {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        if let Some(rc) = self.fail_read.take() {
            return Err(SensorError::AdcReadFailed(rc));
        }
        Ok(self.script.pop_front().unwrap_or(self.raw))
    }
}

impl ActuatorPort for MockHardware {
    fn set_relay(&mut self, on: bool) -> Result<(), ActuatorError> {
        if let Some(rc) = self.fail_relay {
            return Err(ActuatorError::GpioWriteFailed(rc));
        }
        self.relay_writes.push(on);
        self.relay = on;
        Ok(())
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(records: &[(&str, &str)]) -> Self {
        let mut nvs = Self::new();
        for (k, v) in records {
            nvs.store.insert((*k).to_string(), v.as_bytes().to_vec());
        }
        nvs
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }
}

impl StoragePort for MockNvs {
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(key) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.store.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

// ── EventLog ──────────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── NoDelay ───────────────────────────────────────────────────

/// Records requested delay instead of sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

// ── Uplink over the simulated WiFi + loopback broker ──────────

pub type TestUplink = ConnectivityManager<WifiLink, LoopbackBroker>;

/// Uplink with valid credentials plus a handle on the shared broker.
pub fn uplink() -> (TestUplink, LoopbackBroker) {
    let mut link = WifiLink::new();
    link.set_credentials("Garage", "password1")
        .expect("test credentials are valid");
    let broker = LoopbackBroker::new(BrokerConfig::from_network(&NetworkConfig::default()));
    let handle = broker.clone();
    let topics = SystemConfig::default().topics;
    (ConnectivityManager::new(link, broker, topics), handle)
}

/// Retained payloads the broker saw on `topic`, oldest first.
#[allow(dead_code)]
pub fn payloads_on(broker: &LoopbackBroker, topic: &str) -> Vec<String> {
    broker
        .published()
        .into_iter()
        .filter(|p| p.topic == topic)
        .map(|p| p.payload)
        .collect()
}
