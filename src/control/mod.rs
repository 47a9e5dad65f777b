//! Control logic: the pump state machine and its runtime accumulator.

pub mod pump;
pub mod runtime;
