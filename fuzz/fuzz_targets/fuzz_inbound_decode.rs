//! Fuzz target: `comms::inbound::decode`
//!
//! Feeds arbitrary payloads on both subscribed topics and checks that
//! every accepted threshold command carries a usable pair.
//!
//! cargo fuzz run fuzz_inbound_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use pumpctl::app::commands::InboundCommand;
use pumpctl::comms::inbound;
use pumpctl::config::Topics;

fuzz_target!(|data: &[u8]| {
    let topics = Topics::default();

    for topic in [topics.settings, topics.control] {
        match inbound::decode(&topics, topic, data) {
            Some(InboundCommand::SetThresholds { low, high }) => {
                assert!(low.is_finite() && low > 0.0, "low {low}");
                assert!(high.is_finite() && high > 0.0, "high {high}");
            }
            Some(InboundCommand::UnmappedControl(v)) => {
                assert!(v != 0 && v != 1, "0/1 must map to SetActuator");
            }
            Some(InboundCommand::SetActuator { .. }) | None => {}
        }
    }
});
