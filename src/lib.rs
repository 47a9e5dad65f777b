//! Pressure-pump controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, with simulation backends on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod comms;
pub mod config;
pub mod control;
pub mod error;
pub mod escalation;
pub mod scheduler;
pub mod storage;

pub mod pins;

// Hardware-facing modules; cfg-gated internally.
pub mod adapters;
pub mod drivers;
pub mod sensors;
