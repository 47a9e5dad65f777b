//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the [`PumpController`] plus the bookkeeping the
//! periodic tasks share (uptime, runtime that still has to be persisted
//! or reported). Each task body takes the
//! ports it needs as parameters, so the whole service runs against mock
//! adapters in tests.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        AppService         │
//! ActuatorPort ◀──│  PumpController · uptime  │ ◀─▶ UplinkPort
//!                 └──────────────────────────┘ ◀─▶ StoragePort
//! ```

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::{SystemConfig, Topics};
use crate::control::pump::{Calibration, CommandOutcome, PumpController, Transition};
use crate::error::Fault;
use crate::storage::records::{self, RuntimeSnapshot};

use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort, StoragePort, UplinkPort};

/// Info-topic payload while the sensor fault is latched.
pub const FAULT_PAYLOAD: &str = "Error pressure!";

type Payload = heapless::String<32>;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    pump: PumpController,
    topics: Topics,
    uptime_minutes: u32,
    /// The last runtime write failed; retried by the persist task.
    runtime_dirty: bool,
    /// Runtime that carried a minute and has not been reported yet.
    pending_runtime: Option<RuntimeSnapshot>,
}

impl AppService {
    /// Load persisted thresholds and runtime, falling back to defaults.
    pub fn load(
        config: &SystemConfig,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Self {
        let thresholds = records::load_thresholds(store, config.default_thresholds);
        let runtime = records::load_runtime(store);
        sink.emit(&AppEvent::Started { thresholds, runtime });
        info!(
            "AppService: started, thresholds {:.1}/{:.1} bar",
            thresholds.low, thresholds.high
        );
        Self {
            pump: PumpController::new(Calibration::from_config(config), thresholds, runtime),
            topics: config.topics.clone(),
            uptime_minutes: 0,
            runtime_dirty: false,
            pending_runtime: None,
        }
    }

    // ── Task: runtime persist (60 s) ──────────────────────────

    pub fn persist_uptime(&mut self, store: &mut impl StoragePort, uplink: &mut impl UplinkPort) {
        self.uptime_minutes = self.uptime_minutes.saturating_add(1);

        if self.runtime_dirty {
            let snap = self.pump.runtime();
            match records::save_runtime(store, &snap) {
                Ok(()) => {
                    info!("AppService: runtime record rewritten");
                    self.runtime_dirty = false;
                }
                Err(e) => warn!("AppService: runtime still not persisted: {}", e),
            }
        }

        let mut payload = Payload::new();
        let _ = write!(payload, "{}", self.uptime_minutes);
        uplink.publish(self.topics.working_time, &payload);
    }

    // ── Task: connectivity check (5 s) ────────────────────────

    pub fn check_connectivity(&mut self, uplink: &mut impl UplinkPort) {
        uplink.ensure_link();
        uplink.ensure_session();
    }

    // ── Task: data publish (2 s) ──────────────────────────────

    pub fn publish_data(&mut self, uplink: &mut impl UplinkPort, sink: &mut impl EventSink) {
        if uplink.has_session() {
            uplink.poll_inbound();

            if self.pump.is_pressure_updated() {
                let mut payload = Payload::new();
                let _ = write!(payload, "{:.1} bar", self.pump.pressure());
                if uplink.publish(self.topics.data, &payload) {
                    self.pump.mark_pressure_reported();
                }
            }

            if let Some(snap) = self.pending_runtime {
                if uplink.publish(self.topics.working_time, &snap.encode()) {
                    self.pending_runtime = None;
                }
            }

            if self.pump.is_faulted() {
                uplink.publish(self.topics.info, FAULT_PAYLOAD);
            }
        }

        sink.emit(&AppEvent::Telemetry(self.build_telemetry(uplink.has_session())));
    }

    // ── Task: sampling + actuation (200 ms) ───────────────────

    /// One control cycle. Only relay and ADC errors escape.
    pub fn sample_and_actuate(
        &mut self,
        now: u32,
        hw: &mut (impl SensorPort + ActuatorPort),
        delay: &mut impl DelayNs,
        store: &mut impl StoragePort,
        uplink: &mut impl UplinkPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Fault> {
        // 1. Remote commands buffered since the last cycle. An override
        // holds until the next cycle's regulation.
        let mut overridden = false;
        while let Some(cmd) = uplink.take_command() {
            let outcome = self.pump.apply_inbound_command(cmd, now, hw, store)?;
            overridden |= matches!(outcome, CommandOutcome::Override { .. });
            self.on_command(outcome, store, sink);
        }

        // 2. Latched fault wins over everything above.
        let t = self.pump.enforce_fault_latch(now, hw)?;
        self.on_transition(t, store, sink);

        // 3. Fresh reading.
        self.pump.sample(hw, delay)?;

        // 4. Safety cutoff on the previous cycle's pressure.
        let t = self.pump.check_high_pressure_override(now, hw)?;
        if t != Transition::Unchanged {
            sink.emit(&AppEvent::HighPressureCutoff {
                pressure: self.pump.pressure(),
                high: self.pump.thresholds().high,
            });
        }
        self.on_transition(t, store, sink);

        // 5. Plausibility.
        let health = self.pump.check_health(now, hw)?;
        if health.newly_latched {
            sink.emit(&AppEvent::SensorFault { raw: self.pump.raw() });
            uplink.publish(self.topics.info, FAULT_PAYLOAD);
        }
        self.on_transition(health.transition, store, sink);

        // 6. Regulate.
        if !self.pump.is_faulted() {
            self.pump.convert();
            if !overridden {
                let t = self.pump.apply_hysteresis(now, hw)?;
                self.on_transition(t, store, sink);
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self, session_up: bool) -> TelemetryData {
        TelemetryData {
            pressure_bar: self.pump.pressure(),
            raw: self.pump.raw(),
            thresholds: self.pump.thresholds(),
            actuator: self.pump.actuator(),
            fault: self.pump.is_faulted(),
            runtime: self.pump.runtime(),
            uptime_minutes: self.uptime_minutes,
            session_up,
        }
    }

    pub fn pump(&self) -> &PumpController {
        &self.pump
    }

    pub fn uptime_minutes(&self) -> u32 {
        self.uptime_minutes
    }

    pub fn is_runtime_dirty(&self) -> bool {
        self.runtime_dirty
    }

    pub fn pending_runtime(&self) -> Option<RuntimeSnapshot> {
        self.pending_runtime
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_command(
        &mut self,
        outcome: CommandOutcome,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match outcome {
            CommandOutcome::ThresholdsUpdated(pair) => {
                sink.emit(&AppEvent::ThresholdsUpdated(pair));
            }
            CommandOutcome::Override { on, transition } => {
                sink.emit(&AppEvent::OverrideApplied { on });
                self.on_transition(transition, store, sink);
            }
            CommandOutcome::ThresholdsUnchanged
            | CommandOutcome::Refused
            | CommandOutcome::Ignored => {}
        }
    }

    fn on_transition(
        &mut self,
        t: Transition,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match t {
            Transition::Unchanged => {}
            Transition::Started => {
                sink.emit(&AppEvent::PumpStarted {
                    pressure: self.pump.pressure(),
                });
            }
            Transition::Stopped(carried) => {
                sink.emit(&AppEvent::PumpStopped {
                    pressure: self.pump.pressure(),
                    runtime: self.pump.runtime(),
                });
                if let Some(snap) = carried {
                    self.record_runtime(snap, store);
                }
            }
        }
    }

    fn record_runtime(&mut self, snap: RuntimeSnapshot, store: &mut impl StoragePort) {
        match records::save_runtime(store, &snap) {
            Ok(()) => self.runtime_dirty = false,
            Err(e) => {
                warn!("AppService: runtime not persisted ({}), will retry", e);
                self.runtime_dirty = true;
            }
        }
        self.pending_runtime = Some(snap);
    }
}
