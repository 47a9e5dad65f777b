//! Fatal-fault escalation.
//!
//! A [`Fault`] that escapes a scheduled task means the sensor or relay
//! could not be driven. There is no local recovery for either, so the
//! device logs the cause, pauses briefly so the log line reaches the
//! console, and restarts.

use embedded_hal::delay::DelayNs;
use log::error;

use crate::app::ports::RestartPort;
use crate::error::{ActuatorError, Fault, SensorError};

pub struct FaultEscalation {
    restart_delay_ms: u32,
}

impl FaultEscalation {
    pub fn new(restart_delay_ms: u32) -> Self {
        Self { restart_delay_ms }
    }

    pub fn escalate(&self, fault: Fault, delay: &mut impl DelayNs, restart: &mut impl RestartPort) {
        match fault {
            Fault::Sensor(SensorError::AdcReadFailed(rc)) => {
                error!("FATAL | pressure ADC read failed (rc={}), restarting", rc);
            }
            Fault::Actuator(ActuatorError::GpioWriteFailed(rc)) => {
                error!("FATAL | pump relay write failed (rc={}), restarting", rc);
            }
        }
        delay.delay_ms(self.restart_delay_ms);
        restart.restart();
    }
}
