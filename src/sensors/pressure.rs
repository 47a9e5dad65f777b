//! Analog pressure transducer and the median denoise window.
//!
//! The ADC is noisy and the pump switches on a single value, so every
//! reading is the median of a short burst of conversions.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via hw_init helpers.
//! On host/test: reads the simulated ADC value (`hw_init::set_adc_raw`).

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::SensorPort;
use crate::config::MAX_SAMPLES;
use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::pins;

pub struct PressureSensor {
    channel: u32,
    last_raw: u16,
}

impl Default for PressureSensor {
    fn default() -> Self {
        Self::new(pins::PRESSURE_ADC_CHANNEL)
    }
}

impl PressureSensor {
    pub fn new(channel: u32) -> Self {
        Self { channel, last_raw: 0 }
    }

    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }
}

impl SensorPort for PressureSensor {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let raw = hw_init::adc1_read(self.channel)?;
        self.last_raw = raw;
        Ok(raw)
    }
}

/// Take `samples` raw readings, pausing `interval_ms` after each, and
/// return the median.
///
/// The window is clamped to `1..=MAX_SAMPLES`. For an even count the
/// upper of the two middle values is used (index `len / 2`).
pub fn denoise(
    sensor: &mut impl SensorPort,
    delay: &mut impl DelayNs,
    samples: usize,
    interval_ms: u32,
) -> Result<u16, SensorError> {
    let n = samples.clamp(1, MAX_SAMPLES);
    let mut window: heapless::Vec<u16, MAX_SAMPLES> = heapless::Vec::new();
    for _ in 0..n {
        // Capacity is MAX_SAMPLES and n is clamped to it.
        let _ = window.push(sensor.read_raw()?);
        delay.delay_ms(interval_ms);
    }
    window.sort_unstable();
    let median = window[window.len() / 2];
    debug!("pressure: window {:?} -> {}", window.as_slice(), median);
    Ok(median)
}
