//! Integration tests for `ConnectivityManager` over the simulated WiFi
//! link and the loopback broker.

use pumpctl::app::commands::InboundCommand;
use pumpctl::app::ports::UplinkPort;
use pumpctl::comms::connectivity::{ConnectionState, ONLINE_PAYLOAD, PENDING_CAP};
use pumpctl::config::Topics;

use super::mock_hw::{payloads_on, uplink};

fn tick(up: &mut impl UplinkPort) {
    up.ensure_link();
    up.ensure_session();
}

#[test]
fn link_failures_are_retried_on_each_tick() {
    let (mut up, broker) = uplink();
    up.link_mut().sim_fail_next(2);

    tick(&mut up);
    assert_eq!(up.state(), ConnectionState::Disconnected);
    tick(&mut up);
    assert_eq!(up.state(), ConnectionState::Disconnected);
    tick(&mut up);
    assert_eq!(up.state(), ConnectionState::SessionUp);
    assert_eq!(up.link().sim_attempts(), 3);
    assert_eq!(broker.sessions_opened(), 1);
}

#[test]
fn session_subscribes_and_announces_itself() {
    let (mut up, broker) = uplink();
    let topics = Topics::default();
    tick(&mut up);

    assert_eq!(broker.subscriptions(), vec![topics.control, topics.settings]);
    assert_eq!(payloads_on(&broker, topics.info), vec![ONLINE_PAYLOAD]);
    assert_eq!(broker.client_id(), "pressure_sensor");
}

#[test]
fn unreachable_broker_leaves_the_link_up() {
    let (mut up, broker) = uplink();
    broker.set_reachable(false);

    tick(&mut up);
    assert_eq!(up.state(), ConnectionState::LinkUp);
    assert!(!up.publish(Topics::default().data, "1.0 bar"));

    broker.set_reachable(true);
    tick(&mut up);
    assert_eq!(up.state(), ConnectionState::SessionUp);
}

#[test]
fn closed_session_is_reopened_and_resubscribed() {
    let (mut up, broker) = uplink();
    let topics = Topics::default();
    tick(&mut up);

    broker.kick_sessions();
    assert!(!up.publish(topics.data, "4.0 bar"));
    assert_eq!(up.state(), ConnectionState::LinkUp);

    tick(&mut up);
    assert_eq!(up.state(), ConnectionState::SessionUp);
    assert_eq!(broker.sessions_opened(), 2);
    assert_eq!(broker.subscriptions().len(), 2);
    assert_eq!(payloads_on(&broker, topics.info), vec![ONLINE_PAYLOAD, ONLINE_PAYLOAD]);
}

#[test]
fn poll_error_drops_the_session() {
    let (mut up, broker) = uplink();
    tick(&mut up);
    broker.kick_sessions();

    up.poll_inbound();
    assert!(!up.has_session());
}

#[test]
fn lost_link_drops_everything_and_reconnects() {
    let (mut up, broker) = uplink();
    tick(&mut up);
    up.link_mut().sim_drop();

    up.ensure_link();
    // The simulated AP accepts the reconnect straight away.
    assert_eq!(up.state(), ConnectionState::LinkUp);
    up.ensure_session();
    assert_eq!(up.state(), ConnectionState::SessionUp);
    assert_eq!(broker.sessions_opened(), 2);
}

#[test]
fn inbound_messages_are_decoded_in_arrival_order() {
    let (mut up, broker) = uplink();
    let topics = Topics::default();
    tick(&mut up);

    broker.inject(topics.settings, b"3.5|4.5");
    broker.inject(topics.control, b"garbage");
    broker.inject(topics.control, b"0");
    broker.inject(topics.control, b"7");
    broker.inject("some/other/topic", b"1");
    up.poll_inbound();

    assert_eq!(
        up.take_command(),
        Some(InboundCommand::SetThresholds { low: 3.5, high: 4.5 })
    );
    assert_eq!(up.take_command(), Some(InboundCommand::SetActuator { on: false }));
    assert_eq!(up.take_command(), Some(InboundCommand::UnmappedControl(7)));
    assert_eq!(up.take_command(), None);
}

#[test]
fn full_command_buffer_keeps_the_newest() {
    let (mut up, broker) = uplink();
    let topics = Topics::default();
    tick(&mut up);

    for i in 0..=PENDING_CAP {
        broker.inject(topics.control, format!("{}", i + 10).as_bytes());
    }
    up.poll_inbound();

    assert_eq!(up.pending_len(), PENDING_CAP);
    assert_eq!(up.take_command(), Some(InboundCommand::UnmappedControl(11)));
}

#[test]
fn no_credentials_means_no_attempts() {
    let (_, broker) = uplink();
    let link = pumpctl::adapters::wifi::WifiLink::new();
    let mut up = pumpctl::comms::connectivity::ConnectivityManager::new(
        link,
        broker.clone(),
        Topics::default(),
    );
    tick(&mut up);
    tick(&mut up);
    assert_eq!(up.state(), ConnectionState::Disconnected);
    assert_eq!(up.link().sim_attempts(), 0);
    assert_eq!(broker.sessions_opened(), 0);
}
