//! Hardware adapter, bridging real peripherals to domain port traits.
//!
//! Owns the pressure sensor and the relay driver, exposing them through
//! [`SensorPort`] and [`ActuatorPort`]. This is the only module in the
//! system that touches actual hardware. On non-espidf targets the
//! underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::relay::RelayDriver;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::pressure::PressureSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensor: PressureSensor,
    relay: RelayDriver,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new(PressureSensor::default(), RelayDriver::default())
    }
}

impl HardwareAdapter {
    pub fn new(sensor: PressureSensor, relay: RelayDriver) -> Self {
        Self { sensor, relay }
    }

    pub fn last_raw(&self) -> u16 {
        self.sensor.last_raw()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.sensor.read_raw()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_relay(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.relay.set(on)
    }
}
