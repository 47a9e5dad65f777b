//! MQTT adapter.
//!
//! Implements [`MessagingPort`](crate::app::ports::MessagingPort) /
//! [`SessionPort`](crate::app::ports::SessionPort).
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` with an event callback.
//!   The callback runs on the ESP-IDF MQTT task and forwards connection
//!   changes and received messages over a `std::sync::mpsc` channel; the
//!   main loop drains it in `SessionPort::poll`.
//! - **other targets**: an in-process loopback broker whose state is
//!   shared with the test that created it.
//!
//! All publishes are retained, QoS 0.

use log::info;

#[cfg(target_os = "espidf")]
pub use esp_impl::{EspBroker, EspSession};

#[cfg(not(target_os = "espidf"))]
pub use sim::{LoopbackBroker, LoopbackSession, Published};

/// Broker address and login.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub url: &'static str,
    pub client_id: &'static str,
    pub username: &'static str,
    pub password: &'static str,
}

impl BrokerConfig {
    pub fn from_network(net: &crate::config::NetworkConfig) -> Self {
        Self {
            url: net.broker_url,
            client_id: net.client_id,
            username: net.username,
            password: net.password,
        }
    }
}

#[cfg(any(target_os = "espidf", test))]
fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp_impl {
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
    use std::time::Duration;

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
    use log::{info, warn};

    use super::{non_empty, BrokerConfig};
    use crate::app::ports::{MessagingPort, SessionError, SessionPort};

    /// How long `open_session` waits for the broker CONNACK.
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

    enum MqttEvent {
        Connected,
        Disconnected,
        Message { topic: String, data: Vec<u8> },
    }

    pub struct EspBroker {
        cfg: BrokerConfig,
    }

    impl EspBroker {
        pub fn new(cfg: BrokerConfig) -> Self {
            Self { cfg }
        }
    }

    pub struct EspSession {
        client: EspMqttClient<'static>,
        rx: Receiver<MqttEvent>,
    }

    fn forward(tx: &Sender<MqttEvent>, payload: EventPayload<'_, esp_idf_svc::sys::EspError>) {
        let ev = match payload {
            EventPayload::Connected(_) => MqttEvent::Connected,
            EventPayload::Disconnected => MqttEvent::Disconnected,
            EventPayload::Received { topic: Some(topic), data, .. } => MqttEvent::Message {
                topic: topic.to_string(),
                data: data.to_vec(),
            },
            _ => return,
        };
        // Receiver gone means the session was dropped.
        let _ = tx.send(ev);
    }

    impl MessagingPort for EspBroker {
        type Session = EspSession;

        fn open_session(&mut self) -> Result<EspSession, SessionError> {
            let conf = MqttClientConfiguration {
                client_id: Some(self.cfg.client_id),
                username: non_empty(self.cfg.username),
                password: non_empty(self.cfg.password),
                ..Default::default()
            };
            let (tx, rx) = mpsc::channel();
            let client = EspMqttClient::new_cb(self.cfg.url, &conf, move |event| {
                forward(&tx, event.payload());
            })
            .map_err(|e| {
                warn!("MQTT: client create failed: {:?}", e);
                SessionError::ConnectFailed
            })?;

            loop {
                match rx.recv_timeout(CONNECT_TIMEOUT) {
                    Ok(MqttEvent::Connected) => break,
                    Ok(_) => continue,
                    Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                        warn!("MQTT: no CONNACK from {}", self.cfg.url);
                        return Err(SessionError::ConnectFailed);
                    }
                }
            }
            info!("MQTT: connected to {}", self.cfg.url);
            Ok(EspSession { client, rx })
        }
    }

    impl SessionPort for EspSession {
        fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
            self.client
                .subscribe(topic, QoS::AtMostOnce)
                .map(|_| ())
                .map_err(|_| SessionError::SubscribeFailed)
        }

        fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
            self.client
                .publish(topic, QoS::AtMostOnce, retain, payload)
                .map(|_| ())
                .map_err(|_| SessionError::PublishFailed)
        }

        fn poll(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) -> Result<(), SessionError> {
            loop {
                match self.rx.try_recv() {
                    Ok(MqttEvent::Message { topic, data }) => on_message(&topic, &data),
                    Ok(MqttEvent::Connected) => {}
                    Ok(MqttEvent::Disconnected) | Err(TryRecvError::Disconnected) => {
                        return Err(SessionError::Closed);
                    }
                    Err(TryRecvError::Empty) => return Ok(()),
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host loopback
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::BrokerConfig;
    use crate::app::ports::{MessagingPort, SessionError, SessionPort};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Published {
        pub topic: String,
        pub payload: String,
        pub retain: bool,
    }

    #[derive(Default)]
    struct State {
        reachable: bool,
        subscriptions: Vec<String>,
        published: Vec<Published>,
        inbox: VecDeque<(String, Vec<u8>)>,
        sessions_opened: u32,
        /// Bumped to invalidate live sessions.
        generation: u32,
    }

    /// In-process broker. Clones share state.
    #[derive(Clone)]
    pub struct LoopbackBroker {
        cfg: BrokerConfig,
        state: Rc<RefCell<State>>,
    }

    impl LoopbackBroker {
        pub fn new(cfg: BrokerConfig) -> Self {
            let state = State {
                reachable: true,
                ..State::default()
            };
            Self {
                cfg,
                state: Rc::new(RefCell::new(state)),
            }
        }

        pub fn set_reachable(&self, reachable: bool) {
            self.state.borrow_mut().reachable = reachable;
        }

        /// Close every live session from the broker side.
        pub fn kick_sessions(&self) {
            self.state.borrow_mut().generation += 1;
        }

        /// Queue a message for delivery to subscribed sessions.
        pub fn inject(&self, topic: &str, payload: &[u8]) {
            self.state
                .borrow_mut()
                .inbox
                .push_back((topic.to_string(), payload.to_vec()));
        }

        pub fn published(&self) -> Vec<Published> {
            self.state.borrow().published.clone()
        }

        pub fn subscriptions(&self) -> Vec<String> {
            self.state.borrow().subscriptions.clone()
        }

        pub fn sessions_opened(&self) -> u32 {
            self.state.borrow().sessions_opened
        }

        pub fn client_id(&self) -> &str {
            self.cfg.client_id
        }
    }

    pub struct LoopbackSession {
        state: Rc<RefCell<State>>,
        generation: u32,
    }

    impl LoopbackSession {
        fn check_live(&self) -> Result<(), SessionError> {
            let s = self.state.borrow();
            if !s.reachable || s.generation != self.generation {
                return Err(SessionError::Closed);
            }
            Ok(())
        }
    }

    impl MessagingPort for LoopbackBroker {
        type Session = LoopbackSession;

        fn open_session(&mut self) -> Result<LoopbackSession, SessionError> {
            let mut s = self.state.borrow_mut();
            if !s.reachable {
                return Err(SessionError::ConnectFailed);
            }
            s.sessions_opened += 1;
            s.subscriptions.clear();
            Ok(LoopbackSession {
                state: Rc::clone(&self.state),
                generation: s.generation,
            })
        }
    }

    impl SessionPort for LoopbackSession {
        fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
            self.check_live().map_err(|_| SessionError::SubscribeFailed)?;
            self.state.borrow_mut().subscriptions.push(topic.to_string());
            Ok(())
        }

        fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
            self.check_live().map_err(|_| SessionError::PublishFailed)?;
            self.state.borrow_mut().published.push(Published {
                topic: topic.to_string(),
                payload: String::from_utf8_lossy(payload).into_owned(),
                retain,
            });
            Ok(())
        }

        fn poll(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) -> Result<(), SessionError> {
            self.check_live()?;
            let delivered: Vec<(String, Vec<u8>)> = {
                let mut s = self.state.borrow_mut();
                let subs = s.subscriptions.clone();
                let inbox = core::mem::take(&mut s.inbox);
                inbox.into_iter().filter(|(t, _)| subs.contains(t)).collect()
            };
            for (topic, data) in &delivered {
                on_message(topic, data);
            }
            Ok(())
        }
    }
}

/// Log the broker target once at boot.
pub fn log_target(cfg: &BrokerConfig) {
    info!("MQTT: broker {} as '{}'", cfg.url, cfg.client_id);
}
