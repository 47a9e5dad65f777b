//! GPIO / peripheral pin assignments for the pump controller board.
//!
//! Single source of truth. Every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pressure transducer (analog, ADC1)
// ---------------------------------------------------------------------------

/// 0.5–4.5 V ratiometric pressure sensor through a divider.
pub const PRESSURE_ADC_GPIO: i32 = 5;
/// ADC1 channel wired to [`PRESSURE_ADC_GPIO`].
pub const PRESSURE_ADC_CHANNEL: u32 = 4;

// ---------------------------------------------------------------------------
// Pump relay (solid-state)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = pump energised.
pub const PUMP_RELAY_GPIO: i32 = 14;
