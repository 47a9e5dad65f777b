//! Integration tests for the AppService → PumpController → relay pipeline.
//!
//! The uplink is the real `ConnectivityManager` over the simulated WiFi
//! link and loopback broker, so remote commands travel the same decode and
//! buffering path they do on hardware.

use pumpctl::adapters::mqtt::LoopbackBroker;
use pumpctl::adapters::system::SystemRestart;
use pumpctl::app::events::AppEvent;
use pumpctl::app::ports::UplinkPort;
use pumpctl::app::service::{AppService, FAULT_PAYLOAD};
use pumpctl::config::SystemConfig;
use pumpctl::control::pump::ActuatorState;
use pumpctl::error::{ActuatorError, Fault, SensorError};
use pumpctl::escalation::FaultEscalation;
use pumpctl::storage::records::{RuntimeSnapshot, ThresholdPair};

use super::mock_hw::{payloads_on, uplink, EventLog, MockHardware, MockNvs, NoDelay, TestUplink};

struct Rig {
    cfg: SystemConfig,
    app: AppService,
    hw: MockHardware,
    nvs: MockNvs,
    up: TestUplink,
    broker: LoopbackBroker,
    log: EventLog,
    now: u32,
}

impl Rig {
    fn new(bar: f32) -> Self {
        Self::with_nvs(bar, MockNvs::new())
    }

    fn with_nvs(bar: f32, mut nvs: MockNvs) -> Self {
        let cfg = SystemConfig::default();
        let mut log = EventLog::new();
        let app = AppService::load(&cfg, &mut nvs, &mut log);
        let (up, broker) = uplink();
        Self {
            cfg,
            app,
            hw: MockHardware::at_pressure(bar),
            nvs,
            up,
            broker,
            log,
            now: 0,
        }
    }

    fn online(&mut self) {
        self.app.check_connectivity(&mut self.up);
        assert!(self.up.has_session());
    }

    fn cycle(&mut self) -> Result<(), Fault> {
        self.now = self.now.wrapping_add(self.cfg.sampling_interval_ms);
        self.app.sample_and_actuate(
            self.now,
            &mut self.hw,
            &mut NoDelay::default(),
            &mut self.nvs,
            &mut self.up,
            &mut self.log,
        )
    }

    fn publish(&mut self) {
        self.app.publish_data(&mut self.up, &mut self.log);
    }

    /// Deliver a message and let the data task buffer it.
    fn remote(&mut self, topic: &str, payload: &str) {
        self.broker.inject(topic, payload.as_bytes());
        self.publish();
    }
}

// ── Hysteresis ────────────────────────────────────────────────

#[test]
fn pump_cycles_with_a_dead_band() {
    let mut rig = Rig::new(3.0);

    rig.cycle().unwrap();
    assert!(rig.hw.relay, "below low threshold starts the pump");

    rig.hw.set_pressure(4.5);
    rig.cycle().unwrap();
    assert!(rig.hw.relay, "dead band keeps the pump running");

    rig.hw.set_pressure(5.0);
    rig.cycle().unwrap();
    assert!(!rig.hw.relay, "reaching high threshold stops the pump");

    rig.hw.set_pressure(4.5);
    rig.cycle().unwrap();
    assert!(!rig.hw.relay, "dead band keeps the pump stopped");

    rig.hw.set_pressure(3.9);
    rig.cycle().unwrap();
    assert!(rig.hw.relay);
    assert_eq!(rig.hw.starts(), 2);
    assert_eq!(rig.log.count(|e| matches!(e, AppEvent::PumpStarted { .. })), 2);
    assert_eq!(rig.log.count(|e| matches!(e, AppEvent::PumpStopped { .. })), 1);
}

#[test]
fn pressure_is_rounded_to_a_tenth() {
    let mut rig = Rig::new(4.44);
    rig.cycle().unwrap();
    let p = rig.app.pump().pressure();
    assert!((p * 10.0 - (p * 10.0).round()).abs() < 1e-4, "got {p}");
}

// ── Sensor fault latch ────────────────────────────────────────

#[test]
fn implausible_reading_latches_fault_for_good() {
    let mut rig = Rig::new(3.0);
    rig.online();
    rig.cycle().unwrap();
    assert!(rig.hw.relay);

    rig.hw.raw = 50;
    rig.cycle().unwrap();
    assert!(!rig.hw.relay);
    assert!(rig.app.pump().is_faulted());
    assert_eq!(rig.log.count(|e| *e == AppEvent::SensorFault { raw: 50 }), 1);
    assert_eq!(
        payloads_on(&rig.broker, rig.cfg.topics.info),
        vec!["working".to_string(), FAULT_PAYLOAD.to_string()]
    );

    // Sensor recovers: pressure is low again, but the latch holds.
    rig.hw.set_pressure(3.0);
    for _ in 0..5 {
        rig.cycle().unwrap();
    }
    assert!(!rig.hw.relay);
    assert_eq!(rig.log.count(|e| matches!(e, AppEvent::SensorFault { .. })), 1);

    // A remote ON is refused while latched.
    rig.remote(rig.cfg.topics.control, "1");
    rig.cycle().unwrap();
    assert!(!rig.hw.relay);
    assert_eq!(rig.log.count(|e| matches!(e, AppEvent::OverrideApplied { .. })), 0);

    // Every data tick repeats the error on the info topic.
    let info = payloads_on(&rig.broker, rig.cfg.topics.info);
    assert_eq!(info.last().map(String::as_str), Some(FAULT_PAYLOAD));
    assert!(rig.app.build_telemetry(true).fault);
}

#[test]
fn raw_at_the_plausibility_limit_is_a_fault() {
    let mut rig = Rig::new(3.0);
    rig.hw.raw = rig.cfg.min_plausible_raw;
    rig.cycle().unwrap();
    assert!(rig.app.pump().is_faulted());

    let mut rig = Rig::new(3.0);
    rig.hw.raw = rig.cfg.min_plausible_raw + 1;
    rig.cycle().unwrap();
    assert!(!rig.app.pump().is_faulted());
}

// ── Remote commands ───────────────────────────────────────────

#[test]
fn remote_thresholds_apply_before_regulation_and_persist() {
    let mut rig = Rig::new(3.2);
    rig.online();

    rig.remote(rig.cfg.topics.settings, "3.0|3.5");
    rig.cycle().unwrap();

    let pair = ThresholdPair { low: 3.0, high: 3.5 };
    assert_eq!(rig.app.pump().thresholds(), pair);
    assert_eq!(rig.nvs.get("thresholds").as_deref(), Some("3.0|3.5"));
    assert!(!rig.hw.relay, "3.2 bar is inside the new dead band");
    assert_eq!(rig.log.count(|e| *e == AppEvent::ThresholdsUpdated(pair)), 1);
}

#[test]
fn thresholds_apply_even_when_not_persisted() {
    let mut rig = Rig::new(3.2);
    rig.online();
    rig.nvs.fail_writes = true;

    rig.remote(rig.cfg.topics.settings, "2.5|3.0");
    rig.cycle().unwrap();

    assert_eq!(rig.app.pump().thresholds(), ThresholdPair { low: 2.5, high: 3.0 });
    assert_eq!(rig.nvs.get("thresholds").as_deref(), Some("4.0|5.0"));
}

#[test]
fn malformed_remote_payloads_change_nothing() {
    let mut rig = Rig::new(4.5);
    rig.online();
    rig.remote(rig.cfg.topics.settings, "abc|5.0");
    rig.remote(rig.cfg.topics.settings, "-1.0|5.0");
    rig.remote(rig.cfg.topics.control, "on");
    rig.remote(rig.cfg.topics.control, "2");
    rig.cycle().unwrap();

    assert_eq!(rig.app.pump().thresholds(), ThresholdPair::DEFAULT);
    assert!(!rig.hw.relay);
}

#[test]
fn override_is_one_shot_within_the_dead_band() {
    let mut rig = Rig::new(4.5);
    rig.online();
    rig.cycle().unwrap();
    assert!(!rig.hw.relay);

    rig.remote(rig.cfg.topics.control, "1");
    rig.cycle().unwrap();
    assert!(rig.hw.relay);
    assert_eq!(rig.app.pump().actuator(), ActuatorState::On);

    rig.remote(rig.cfg.topics.control, " 0 ");
    rig.cycle().unwrap();
    assert!(!rig.hw.relay);
    assert_eq!(
        rig.log.count(|e| matches!(e, AppEvent::OverrideApplied { .. })),
        2
    );
}

#[test]
fn off_override_below_low_holds_for_its_cycle() {
    let mut rig = Rig::new(3.0);
    rig.online();
    rig.cycle().unwrap();
    assert!(rig.hw.relay);

    rig.remote(rig.cfg.topics.control, "0");
    rig.cycle().unwrap();
    assert_eq!(rig.hw.relay_writes, vec![true, false]);
    assert_eq!(rig.app.pump().actuator(), ActuatorState::Off);
    assert_eq!(rig.log.count(|e| matches!(e, AppEvent::PumpStarted { .. })), 1);
    assert_eq!(rig.log.count(|e| matches!(e, AppEvent::PumpStopped { .. })), 1);

    // Regulation takes over again on the following cycle.
    rig.cycle().unwrap();
    assert_eq!(rig.hw.relay_writes, vec![true, false, true]);
    assert_eq!(rig.hw.starts(), 2);
}

#[test]
fn override_on_above_high_is_cut_off_in_the_same_cycle() {
    let mut rig = Rig::new(6.0);
    rig.online();
    rig.cycle().unwrap();

    rig.remote(rig.cfg.topics.control, "1");
    rig.cycle().unwrap();

    assert!(!rig.hw.relay);
    assert_eq!(rig.hw.relay_writes.iter().filter(|&&w| w).count(), 1);
    assert_eq!(
        rig.log.count(|e| *e == AppEvent::HighPressureCutoff { pressure: 6.0, high: 5.0 }),
        1
    );
}

// ── Runtime accounting ────────────────────────────────────────

#[test]
fn minute_long_run_is_persisted_and_reported() {
    let mut rig = Rig::new(3.0);
    rig.cycle().unwrap();
    assert!(rig.hw.relay);

    rig.now += 61_000 - rig.cfg.sampling_interval_ms;
    rig.hw.set_pressure(5.5);
    rig.cycle().unwrap();
    assert!(!rig.hw.relay);

    let snap = RuntimeSnapshot { minutes: 1, hours: 0, days: 0 };
    assert_eq!(rig.nvs.get("runtime").as_deref(), Some("1|0|0"));
    assert_eq!(rig.app.pending_runtime(), Some(snap));

    rig.online();
    rig.publish();
    assert_eq!(payloads_on(&rig.broker, rig.cfg.topics.working_time), vec!["1|0|0"]);
    assert_eq!(payloads_on(&rig.broker, rig.cfg.topics.data), vec!["5.5 bar"]);
    assert_eq!(rig.app.pending_runtime(), None);
}

#[test]
fn short_runs_are_not_persisted() {
    let mut rig = Rig::new(3.0);
    rig.cycle().unwrap();
    rig.hw.set_pressure(5.5);
    rig.cycle().unwrap();

    assert!(!rig.hw.relay);
    assert_eq!(rig.nvs.get("runtime").as_deref(), Some("0|0|0"));
    assert_eq!(rig.app.pending_runtime(), None);
}

#[test]
fn failed_runtime_write_is_retried_by_the_persist_task() {
    let mut rig = Rig::new(3.0);
    rig.cycle().unwrap();
    rig.nvs.fail_writes = true;
    rig.now += 120_000;
    rig.hw.set_pressure(5.5);
    rig.cycle().unwrap();
    assert!(rig.app.is_runtime_dirty());
    assert_eq!(rig.nvs.get("runtime").as_deref(), Some("0|0|0"));

    rig.nvs.fail_writes = false;
    rig.app.persist_uptime(&mut rig.nvs, &mut rig.up);
    assert!(!rig.app.is_runtime_dirty());
    assert_eq!(rig.nvs.get("runtime").as_deref(), Some("2|0|0"));
}

// ── Publishing ────────────────────────────────────────────────

#[test]
fn uptime_minutes_go_out_on_the_working_time_topic() {
    let mut rig = Rig::new(4.5);
    rig.app.persist_uptime(&mut rig.nvs, &mut rig.up);
    rig.online();
    rig.app.persist_uptime(&mut rig.nvs, &mut rig.up);
    rig.app.persist_uptime(&mut rig.nvs, &mut rig.up);

    assert_eq!(rig.app.uptime_minutes(), 3);
    assert_eq!(payloads_on(&rig.broker, rig.cfg.topics.working_time), vec!["2", "3"]);
}

#[test]
fn pressure_is_published_only_when_it_changes() {
    let mut rig = Rig::new(3.0);
    rig.online();
    rig.cycle().unwrap();
    rig.publish();
    rig.publish();

    rig.hw.set_pressure(3.5);
    rig.cycle().unwrap();
    rig.publish();

    assert_eq!(
        payloads_on(&rig.broker, rig.cfg.topics.data),
        vec!["3.0 bar", "3.5 bar"]
    );
    assert!(rig.broker.published().iter().all(|p| p.retain));
}

#[test]
fn telemetry_is_emitted_on_every_data_tick() {
    let mut rig = Rig::new(3.0);
    rig.publish();
    rig.online();
    rig.publish();

    let flags: Vec<bool> = rig
        .log
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(t.session_up),
            _ => None,
        })
        .collect();
    assert_eq!(flags, vec![false, true]);
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_restores_persisted_state() {
    let nvs = MockNvs::with(&[("thresholds", "3.5|6.0"), ("runtime", "5|2|1")]);
    let rig = Rig::with_nvs(4.0, nvs);

    assert_eq!(rig.app.pump().thresholds(), ThresholdPair { low: 3.5, high: 6.0 });
    assert_eq!(
        rig.app.pump().runtime(),
        RuntimeSnapshot { minutes: 5, hours: 2, days: 1 }
    );
    assert!(matches!(rig.log.events.first(), Some(AppEvent::Started { .. })));
}

#[test]
fn malformed_records_fall_back_and_are_rewritten() {
    for bad in ["abc|5.0", "4.0|", "0|5.0", "1.0|2.0|3.0"] {
        let nvs = MockNvs::with(&[("thresholds", bad), ("runtime", "61|0|0")]);
        let rig = Rig::with_nvs(4.0, nvs);

        assert_eq!(rig.app.pump().thresholds(), ThresholdPair::DEFAULT, "{bad}");
        assert_eq!(rig.nvs.get("thresholds").as_deref(), Some("4.0|5.0"));
        assert_eq!(rig.nvs.get("runtime").as_deref(), Some("0|0|0"));
    }
}

// ── Escalation ────────────────────────────────────────────────

#[test]
fn adc_failure_escapes_and_restarts_the_device() {
    let mut rig = Rig::new(3.0);
    rig.hw.fail_read = Some(-3);
    let fault = rig.cycle().unwrap_err();
    assert_eq!(fault, Fault::Sensor(SensorError::AdcReadFailed(-3)));

    let mut delay = NoDelay::default();
    let mut restart = SystemRestart::new();
    FaultEscalation::new(rig.cfg.restart_delay_ms).escalate(fault, &mut delay, &mut restart);
    assert_eq!(delay.total_ms, 1000);
    assert_eq!(restart.requested(), 1);
}

#[test]
fn relay_failure_escapes_as_actuator_fault() {
    let mut rig = Rig::new(3.0);
    rig.hw.fail_relay = Some(-5);
    assert_eq!(
        rig.cycle(),
        Err(Fault::Actuator(ActuatorError::GpioWriteFailed(-5)))
    );
    assert_eq!(rig.app.pump().actuator(), ActuatorState::Off);
}
