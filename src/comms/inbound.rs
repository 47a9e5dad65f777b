//! Inbound message decoding.
//!
//! | Topic      | Payload           | Command                         |
//! |------------|-------------------|---------------------------------|
//! | `settings` | `"<low>\|<high>"` | [`InboundCommand::SetThresholds`] |
//! | `control`  | `"1"` / `"0"`     | [`InboundCommand::SetActuator`]   |
//! | `control`  | any other integer | [`InboundCommand::UnmappedControl`] |
//!
//! Anything else (unknown topic, non-UTF-8, unparseable or non-positive
//! values) yields `None` and is dropped by the caller.

use log::warn;

use crate::app::commands::InboundCommand;
use crate::config::Topics;
use crate::storage::records::ThresholdPair;

pub fn decode(topics: &Topics, topic: &str, payload: &[u8]) -> Option<InboundCommand> {
    let Ok(text) = core::str::from_utf8(payload) else {
        warn!("inbound: non-UTF-8 payload on '{}'", topic);
        return None;
    };
    let cmd = if topic == topics.settings {
        decode_settings(text)
    } else if topic == topics.control {
        decode_control(text)
    } else {
        None
    };
    if cmd.is_none() {
        warn!("inbound: dropped '{}' on '{}'", text.trim(), topic);
    }
    cmd
}

fn decode_settings(text: &str) -> Option<InboundCommand> {
    let pair = ThresholdPair::decode(text)?;
    Some(InboundCommand::SetThresholds {
        low: pair.low,
        high: pair.high,
    })
}

fn decode_control(text: &str) -> Option<InboundCommand> {
    match text.trim().parse::<i64>().ok()? {
        1 => Some(InboundCommand::SetActuator { on: true }),
        0 => Some(InboundCommand::SetActuator { on: false }),
        other => Some(InboundCommand::UnmappedControl(other)),
    }
}
