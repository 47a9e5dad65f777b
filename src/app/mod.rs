//! Application core: domain logic behind port traits.
//!
//! [`service`] holds the four periodic task bodies, [`device`] binds them
//! to concrete ports for the scheduler. All interaction with hardware and
//! the network happens through the traits in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod device;
pub mod events;
pub mod ports;
pub mod service;
