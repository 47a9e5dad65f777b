//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::control::pump::ActuatorState;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | P={:.1}bar raw={} | lo={:.1} hi={:.1} | pump={} fault={} | \
                     run={}d{}h{}m up={}min | mqtt={}",
                    t.pressure_bar,
                    t.raw,
                    t.thresholds.low,
                    t.thresholds.high,
                    match t.actuator {
                        ActuatorState::On => "ON",
                        ActuatorState::Off => "OFF",
                    },
                    t.fault,
                    t.runtime.days,
                    t.runtime.hours,
                    t.runtime.minutes,
                    t.uptime_minutes,
                    if t.session_up { "up" } else { "down" },
                );
            }
            AppEvent::Started { thresholds, runtime } => {
                info!(
                    "START | thresholds={:.1}/{:.1}bar runtime={}",
                    thresholds.low,
                    thresholds.high,
                    runtime.encode()
                );
            }
            AppEvent::PumpStarted { pressure } => {
                info!("PUMP  | ON at {:.1}bar", pressure);
            }
            AppEvent::PumpStopped { pressure, runtime } => {
                info!("PUMP  | OFF at {:.1}bar, total {}", pressure, runtime.encode());
            }
            AppEvent::SensorFault { raw } => {
                warn!("FAULT | sensor raw={} implausible, pump locked off", raw);
            }
            AppEvent::HighPressureCutoff { pressure, high } => {
                warn!("SAFE  | {:.1}bar above {:.1}bar, pump forced off", pressure, high);
            }
            AppEvent::ThresholdsUpdated(pair) => {
                info!("CMD   | thresholds -> {:.1}/{:.1}bar", pair.low, pair.high);
            }
            AppEvent::OverrideApplied { on } => {
                info!("CMD   | override pump {}", if *on { "ON" } else { "OFF" });
            }
        }
    }
}
