//! Scheduler-driven runs of the full `Device` against mock adapters.

use pumpctl::adapters::mqtt::LoopbackBroker;
use pumpctl::app::device::Device;
use pumpctl::app::events::AppEvent;
use pumpctl::app::service::AppService;
use pumpctl::comms::connectivity::ConnectionState;
use pumpctl::config::SystemConfig;
use pumpctl::error::{ActuatorError, Fault};
use pumpctl::scheduler::Scheduler;

use super::mock_hw::{payloads_on, uplink, EventLog, MockHardware, MockNvs, NoDelay, TestUplink};

type TestDevice = Device<MockHardware, MockNvs, TestUplink, NoDelay, EventLog>;

fn device(bar: f32) -> (TestDevice, LoopbackBroker, SystemConfig) {
    let cfg = SystemConfig::default();
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let app = AppService::load(&cfg, &mut nvs, &mut log);
    let (up, broker) = uplink();
    let dev = Device::new(app, MockHardware::at_pressure(bar), nvs, up, NoDelay::default(), log);
    (dev, broker, cfg)
}

#[test]
fn first_ticks_follow_the_task_periods() {
    let (mut dev, broker, cfg) = device(3.0);
    let mut sched = Scheduler::from_config(&cfg, 0);

    // Exactly one period has not elapsed yet.
    sched.poll(200, &mut dev).unwrap();
    assert!(dev.hw().relay_writes.is_empty());

    sched.poll(201, &mut dev).unwrap();
    assert!(dev.hw().relay, "sampling ran");
    assert_eq!(dev.delay_mut().total_ms, 200, "4 reads, 50 ms apart");

    sched.poll(2001, &mut dev).unwrap();
    assert_eq!(dev.uplink().state(), ConnectionState::Disconnected);
    assert_eq!(
        dev.sink().count(|e| matches!(e, AppEvent::Telemetry(t) if !t.session_up)),
        1
    );

    // Connectivity runs before the data task in the same poll.
    sched.poll(5001, &mut dev).unwrap();
    assert_eq!(dev.uplink().state(), ConnectionState::SessionUp);
    assert_eq!(payloads_on(&broker, cfg.topics.info), vec!["working"]);
    assert_eq!(payloads_on(&broker, cfg.topics.data), vec!["3.0 bar"]);

    sched.poll(60_001, &mut dev).unwrap();
    assert_eq!(dev.service().uptime_minutes(), 1);
    assert_eq!(payloads_on(&broker, cfg.topics.working_time), vec!["1"]);
}

#[test]
fn connect_now_brings_the_session_up_before_the_first_tick() {
    let (mut dev, broker, _cfg) = device(4.5);
    dev.connect_now();
    assert_eq!(dev.uplink().state(), ConnectionState::SessionUp);
    assert_eq!(broker.sessions_opened(), 1);
    assert_eq!(broker.subscriptions().len(), 2);
}

#[test]
fn sampling_keeps_running_across_tick_wraparound() {
    let (mut dev, _broker, cfg) = device(3.0);
    let mut sched = Scheduler::from_config(&cfg, u32::MAX - 100);

    sched.poll(50, &mut dev).unwrap();
    assert!(dev.hw().relay_writes.is_empty(), "151 ms elapsed");

    sched.poll(150, &mut dev).unwrap();
    assert!(dev.hw().relay, "251 ms elapsed");
    assert_eq!(dev.service().uptime_minutes(), 0);
}

#[test]
fn relay_fault_escapes_the_poll() {
    let (mut dev, _broker, cfg) = device(3.0);
    dev.hw_mut().fail_relay = Some(-1);
    let mut sched = Scheduler::from_config(&cfg, 0);

    assert_eq!(
        sched.poll(201, &mut dev),
        Err(Fault::Actuator(ActuatorError::GpioWriteFailed(-1)))
    );
}

#[test]
fn remote_command_reaches_the_relay_within_one_data_period() {
    let (mut dev, broker, cfg) = device(4.5);
    dev.connect_now();
    let mut sched = Scheduler::from_config(&cfg, 0);

    broker.inject(cfg.topics.control, b"1");
    let mut now = 0;
    while !dev.hw().relay && now < 2_400 {
        now += 10;
        sched.poll(now, &mut dev).unwrap();
    }
    assert!(dev.hw().relay);
    assert!(now <= 2_210, "applied at {now} ms");
    assert_eq!(dev.sink().count(|e| *e == AppEvent::OverrideApplied { on: true }), 1);
}
