//! Hardware fault types for the pump controller.
//!
//! Only faults that the control loop cannot absorb locally live here.
//! Link, session, and storage errors are separate port-level types
//! (see [`crate::app::ports`]) that their owning component consumes; they
//! can never reach [`FaultEscalation`](crate::escalation::FaultEscalation).
//! All variants are `Copy` so they pass through the scheduler without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level escalated fault
// ---------------------------------------------------------------------------

/// An I/O fault that escaped a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The pressure sensor could not be read.
    Sensor(SensorError),
    /// The pump relay could not be driven.
    Actuator(ActuatorError),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC oneshot read returned an error code.
    AdcReadFailed(i32),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed(rc) => write!(f, "ADC read failed (rc={rc})"),
        }
    }
}

impl From<SensorError> for Fault {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO level write returned an error code.
    GpioWriteFailed(i32),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(rc) => write!(f, "relay GPIO write failed (rc={rc})"),
        }
    }
}

impl From<ActuatorError> for Fault {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Result of a scheduled task body.
pub type Result<T> = core::result::Result<T, Fault>;
