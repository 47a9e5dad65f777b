//! Pump relay driver (solid-state relay on one GPIO).
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator. Hysteresis, the high-pressure cutoff
//! and the latched sensor fault are enforced by
//! [`PumpController`](crate::control::pump::PumpController).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init helpers.
//! On host/test: writes the simulated relay level.

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

pub struct RelayDriver {
    gpio: i32,
}

impl Default for RelayDriver {
    fn default() -> Self {
        Self::new(pins::PUMP_RELAY_GPIO)
    }
}

impl RelayDriver {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        hw_init::gpio_write(self.gpio, on)
    }
}
