//! Sensor drivers.
//!
//! One analog pressure transducer, read as a median of a short burst.

pub mod pressure;
