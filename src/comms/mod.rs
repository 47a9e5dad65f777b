//! Uplink: link/session management and inbound command decoding.

pub mod connectivity;
pub mod inbound;
