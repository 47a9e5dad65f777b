//! Pump hysteresis and fault state machine.
//!
//! [`PumpController`] is the only owner of the actuator state, the fault
//! flag, the threshold pair and the latest reading. Every relay write goes
//! through [`PumpController::drive`], so every ON→OFF edge (hysteresis,
//! high-pressure cutoff, sensor fault or remote override) finalizes the
//! runtime of that run.
//!
//! ```text
//!            p < low                      p >= high
//!   ┌─────┐ ─────────▶ ┌────┐   ┌─────┐ ◀───────── ┌────┐
//!   │ OFF │            │ ON │   │ OFF │            │ ON │
//!   └─────┘            └────┘   └─────┘            └────┘
//!        low <= p < high : no change (dead band)
//! ```
//!
//! ## Fault latch
//!
//! A raw reading at or below `min_plausible_raw` latches the fault flag.
//! Nothing clears it short of a restart, even after the sensor recovers,
//! and the relay is forced OFF on every cycle while it is set. This may be
//! unintended in the field behaviour it reproduces, but it is kept: a
//! stuck-off pump is the safe failure.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::commands::InboundCommand;
use crate::app::ports::{ActuatorPort, SensorPort, StoragePort};
use crate::config::SystemConfig;
use crate::control::runtime::RuntimeAccumulator;
use crate::error::{ActuatorError, SensorError};
use crate::scheduler::elapsed_ms;
use crate::sensors::pressure;
use crate::storage::records::{self, RuntimeSnapshot, ThresholdPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Off,
    On,
}

/// What a relay write did to the actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Started,
    /// The pump was released. Carries the new durable runtime when the
    /// run completed at least one minute.
    Stopped(Option<RuntimeSnapshot>),
}

/// Result of the sensor plausibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheck {
    pub healthy: bool,
    /// The fault flag was set by this check.
    pub newly_latched: bool,
    pub transition: Transition,
}

/// Result of applying one [`InboundCommand`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    ThresholdsUpdated(ThresholdPair),
    ThresholdsUnchanged,
    Override { on: bool, transition: Transition },
    /// An ON override while the fault flag is latched.
    Refused,
    Ignored,
}

/// Sensor calibration and sampling window, copied out of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub volts_per_count: f32,
    pub zero_offset_volts: f32,
    pub bar_per_volt: f32,
    pub min_plausible_raw: u16,
    pub samples: usize,
    pub sample_interval_ms: u32,
}

impl Calibration {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            volts_per_count: cfg.volts_per_count,
            zero_offset_volts: cfg.zero_offset_volts,
            bar_per_volt: cfg.bar_per_volt,
            min_plausible_raw: cfg.min_plausible_raw,
            samples: cfg.samples_per_reading,
            sample_interval_ms: cfg.sample_interval_ms,
        }
    }

    /// Raw counts to bar, clamped at zero, rounded to 0.1 bar.
    pub fn to_bar(&self, raw: u16) -> f32 {
        let volts = f32::from(raw) * self.volts_per_count;
        let bar = (self.bar_per_volt * (volts - self.zero_offset_volts)).max(0.0);
        (bar * 10.0).round() / 10.0
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}

pub struct PumpController {
    cal: Calibration,
    thresholds: ThresholdPair,
    raw: u16,
    pressure: f32,
    /// Pressure last handed to the uplink; `None` until the first report.
    previous_pressure: Option<f32>,
    fault: bool,
    actuator: ActuatorState,
    /// Tick at which the current run started.
    on_since: u32,
    runtime: RuntimeAccumulator,
}

impl PumpController {
    pub fn new(cal: Calibration, thresholds: ThresholdPair, runtime: RuntimeSnapshot) -> Self {
        Self {
            cal,
            thresholds,
            raw: 0,
            pressure: 0.0,
            previous_pressure: None,
            fault: false,
            actuator: ActuatorState::Off,
            on_since: 0,
            runtime: RuntimeAccumulator::from_snapshot(runtime),
        }
    }

    // ── Per-cycle steps ───────────────────────────────────────

    /// Store the median of one denoise window as the current raw value.
    pub fn sample(
        &mut self,
        sensor: &mut impl SensorPort,
        delay: &mut impl DelayNs,
    ) -> Result<u16, SensorError> {
        self.raw = pressure::denoise(sensor, delay, self.cal.samples, self.cal.sample_interval_ms)?;
        Ok(self.raw)
    }

    /// Latch the fault and release the pump on an implausible raw value.
    pub fn check_health(
        &mut self,
        now: u32,
        hw: &mut impl ActuatorPort,
    ) -> Result<HealthCheck, ActuatorError> {
        if self.raw > self.cal.min_plausible_raw {
            return Ok(HealthCheck {
                healthy: true,
                newly_latched: false,
                transition: Transition::Unchanged,
            });
        }
        let newly_latched = !self.fault;
        if newly_latched {
            warn!(
                "pump: raw {} <= {}, sensor fault latched",
                self.raw, self.cal.min_plausible_raw
            );
        }
        self.fault = true;
        let transition = self.drive(false, now, hw)?;
        Ok(HealthCheck {
            healthy: false,
            newly_latched,
            transition,
        })
    }

    /// Release the pump if the last converted pressure is above `high`.
    ///
    /// Runs before this cycle's conversion, so it acts on the previous
    /// cycle's pressure, independent of hysteresis.
    pub fn check_high_pressure_override(
        &mut self,
        now: u32,
        hw: &mut impl ActuatorPort,
    ) -> Result<Transition, ActuatorError> {
        if self.pressure <= self.thresholds.high {
            return Ok(Transition::Unchanged);
        }
        let transition = self.drive(false, now, hw)?;
        if transition != Transition::Unchanged {
            warn!(
                "pump: {:.1} bar above high threshold {:.1}, cut off",
                self.pressure, self.thresholds.high
            );
        }
        Ok(transition)
    }

    pub fn convert(&mut self) -> f32 {
        self.pressure = self.cal.to_bar(self.raw);
        self.pressure
    }

    pub fn apply_hysteresis(
        &mut self,
        now: u32,
        hw: &mut impl ActuatorPort,
    ) -> Result<Transition, ActuatorError> {
        let p = self.pressure;
        match self.actuator {
            ActuatorState::Off if p < self.thresholds.low => self.drive(true, now, hw),
            ActuatorState::On if p >= self.thresholds.high => self.drive(false, now, hw),
            _ => Ok(Transition::Unchanged),
        }
    }

    /// Release the pump while the fault flag is latched.
    pub fn enforce_fault_latch(
        &mut self,
        now: u32,
        hw: &mut impl ActuatorPort,
    ) -> Result<Transition, ActuatorError> {
        if !self.fault {
            return Ok(Transition::Unchanged);
        }
        self.drive(false, now, hw)
    }

    /// Apply a decoded remote command.
    ///
    /// A threshold write failure is logged; the new pair stays in effect
    /// for this boot.
    pub fn apply_inbound_command(
        &mut self,
        cmd: InboundCommand,
        now: u32,
        hw: &mut impl ActuatorPort,
        store: &mut impl StoragePort,
    ) -> Result<CommandOutcome, ActuatorError> {
        match cmd {
            InboundCommand::SetThresholds { low, high } => {
                let Some(pair) = ThresholdPair::new(low, high) else {
                    warn!("pump: rejected thresholds {}|{}", low, high);
                    return Ok(CommandOutcome::Ignored);
                };
                if pair == self.thresholds {
                    return Ok(CommandOutcome::ThresholdsUnchanged);
                }
                self.thresholds = pair;
                info!("pump: thresholds now low={:.1} high={:.1}", pair.low, pair.high);
                if let Err(e) = records::save_thresholds(store, &pair) {
                    warn!("pump: thresholds not persisted: {}", e);
                }
                Ok(CommandOutcome::ThresholdsUpdated(pair))
            }
            InboundCommand::SetActuator { on } => {
                if on && self.fault {
                    warn!("pump: ON override refused, sensor fault latched");
                    return Ok(CommandOutcome::Refused);
                }
                info!("pump: remote override -> {}", if on { "ON" } else { "OFF" });
                let transition = self.drive(on, now, hw)?;
                Ok(CommandOutcome::Override { on, transition })
            }
            InboundCommand::UnmappedControl(value) => {
                info!("pump: control value {} has no action", value);
                Ok(CommandOutcome::Ignored)
            }
        }
    }

    // ── Single relay write path ───────────────────────────────

    /// Write the relay and update actuator state and runtime.
    ///
    /// OFF is always written, even when already off, so a safety release
    /// re-asserts the pin.
    pub fn drive(
        &mut self,
        on: bool,
        now: u32,
        hw: &mut impl ActuatorPort,
    ) -> Result<Transition, ActuatorError> {
        hw.set_relay(on)?;
        match (self.actuator, on) {
            (ActuatorState::Off, true) => {
                self.actuator = ActuatorState::On;
                self.on_since = now;
                info!("pump: ON at {:.1} bar", self.pressure);
                Ok(Transition::Started)
            }
            (ActuatorState::On, false) => {
                self.actuator = ActuatorState::Off;
                let ms = elapsed_ms(now, self.on_since);
                let secs = ms.saturating_add(500) / 1000;
                let carried = self.runtime.tick(secs);
                info!("pump: OFF at {:.1} bar after {} s", self.pressure, secs);
                Ok(Transition::Stopped(carried))
            }
            _ => Ok(Transition::Unchanged),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn thresholds(&self) -> ThresholdPair {
        self.thresholds
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }

    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    /// The current pressure differs from the last reported one.
    pub fn is_pressure_updated(&self) -> bool {
        self.previous_pressure != Some(self.pressure)
    }

    /// Record the current pressure as reported.
    pub fn mark_pressure_reported(&mut self) {
        self.previous_pressure = Some(self.pressure);
    }

    pub fn is_faulted(&self) -> bool {
        self.fault
    }

    pub fn actuator(&self) -> ActuatorState {
        self.actuator
    }

    pub fn runtime(&self) -> RuntimeSnapshot {
        self.runtime.snapshot()
    }
}
