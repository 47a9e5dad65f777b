//! Inbound commands to the pump controller.
//!
//! Produced by [`comms::inbound`](crate::comms::inbound) from MQTT
//! topic/payload pairs and consumed once per sampling cycle.

/// Commands that remote clients can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InboundCommand {
    /// Replace the threshold pair. Both values are already known positive.
    SetThresholds { low: f32, high: f32 },

    /// One-shot relay override; hysteresis resumes on the next cycle.
    SetActuator { on: bool },

    /// An integer control payload other than 0/1. Accepted by the decoder,
    /// but maps to no action.
    UnmappedControl(i64),
}
