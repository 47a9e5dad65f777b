//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (serial log, display).

use crate::control::pump::ActuatorState;
use crate::storage::records::{RuntimeSnapshot, ThresholdPair};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Persisted state has been loaded.
    Started {
        thresholds: ThresholdPair,
        runtime: RuntimeSnapshot,
    },

    /// Hysteresis or an override energised the pump.
    PumpStarted { pressure: f32 },

    /// The pump was released; `runtime` is the cumulative total afterwards.
    PumpStopped { pressure: f32, runtime: RuntimeSnapshot },

    /// Raw sensor value was implausible; the fault flag is now latched.
    SensorFault { raw: u16 },

    /// Pressure exceeded the high threshold outside of hysteresis.
    HighPressureCutoff { pressure: f32, high: f32 },

    /// A remote client replaced the thresholds.
    ThresholdsUpdated(ThresholdPair),

    /// A remote one-shot relay override was applied.
    OverrideApplied { on: bool },

    /// Periodic snapshot (display / serial log).
    Telemetry(TelemetryData),
}

/// A point-in-time snapshot suitable for logging or display.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub pressure_bar: f32,
    pub raw: u16,
    pub thresholds: ThresholdPair,
    pub actuator: ActuatorState,
    pub fault: bool,
    pub runtime: RuntimeSnapshot,
    pub uptime_minutes: u32,
    pub session_up: bool,
}
