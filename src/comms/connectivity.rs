//! Link and messaging-session state machine.
//!
//! ```text
//!                 connect() ok               open + subscribe + "working"
//!  Disconnected ───────────────▶ LinkUp ─────────────────────────────▶ SessionUp(S)
//!       ▲                          ▲                                        │
//!       │ link reports down        │ publish / poll error                   │
//!       └──────────────────────────┴────────────────────────────────────────┘
//! ```
//!
//! The session handle lives inside [`Connection::SessionUp`], so "has a
//! session" and "state is SessionUp" cannot disagree. There is no attempt
//! counter or backoff: every failure drops one level and the next
//! connectivity tick retries.

use log::{info, warn};

use crate::app::commands::InboundCommand;
use crate::app::ports::{LinkPort, MessagingPort, SessionError, SessionPort, UplinkPort};
use crate::comms::inbound;
use crate::config::Topics;

/// Capacity of the pending-command buffer; the oldest entry is dropped
/// when a new command arrives on a full buffer.
pub const PENDING_CAP: usize = 8;

/// Payload published on the info topic when a session comes up.
pub const ONLINE_PAYLOAD: &str = "working";

/// Connection state, owning the live session.
pub enum Connection<S> {
    Disconnected,
    LinkUp,
    SessionUp(S),
}

/// Fieldless view of [`Connection`] for callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    LinkUp,
    SessionUp,
}

pub struct ConnectivityManager<L: LinkPort, M: MessagingPort> {
    link: L,
    messaging: M,
    topics: Topics,
    conn: Connection<M::Session>,
    pending: heapless::Deque<InboundCommand, PENDING_CAP>,
}

impl<L: LinkPort, M: MessagingPort> ConnectivityManager<L, M> {
    pub fn new(link: L, messaging: M, topics: Topics) -> Self {
        Self {
            link,
            messaging,
            topics,
            conn: Connection::Disconnected,
            pending: heapless::Deque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self.conn {
            Connection::Disconnected => ConnectionState::Disconnected,
            Connection::LinkUp => ConnectionState::LinkUp,
            Connection::SessionUp(_) => ConnectionState::SessionUp,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn drop_session(&mut self, err: SessionError) {
        if matches!(self.conn, Connection::SessionUp(_)) {
            warn!("uplink: session dropped ({})", err);
            self.conn = Connection::LinkUp;
        }
    }

    fn open_session(&mut self) -> Result<M::Session, SessionError> {
        let mut session = self.messaging.open_session()?;
        session.subscribe(self.topics.control)?;
        session.subscribe(self.topics.settings)?;
        session.publish(self.topics.info, ONLINE_PAYLOAD.as_bytes(), true)?;
        Ok(session)
    }

    fn enqueue(pending: &mut heapless::Deque<InboundCommand, PENDING_CAP>, cmd: InboundCommand) {
        if pending.is_full() {
            if let Some(old) = pending.pop_front() {
                warn!("uplink: command buffer full, dropped {:?}", old);
            }
        }
        let _ = pending.push_back(cmd);
    }
}

impl<L: LinkPort, M: MessagingPort> UplinkPort for ConnectivityManager<L, M> {
    fn ensure_link(&mut self) {
        if self.link.is_connected() {
            if matches!(self.conn, Connection::Disconnected) {
                info!("uplink: link up");
                self.conn = Connection::LinkUp;
            }
            return;
        }

        if !matches!(self.conn, Connection::Disconnected) {
            warn!("uplink: link lost");
        }
        self.conn = Connection::Disconnected;

        match self.link.connect() {
            Ok(()) if self.link.is_connected() => {
                info!("uplink: link up");
                self.conn = Connection::LinkUp;
            }
            Ok(()) => info!("uplink: association in progress"),
            Err(e) => warn!("uplink: link connect failed ({})", e),
        }
    }

    fn ensure_session(&mut self) {
        if !matches!(self.conn, Connection::LinkUp) {
            return;
        }
        match self.open_session() {
            Ok(session) => {
                info!("uplink: session up");
                self.conn = Connection::SessionUp(session);
            }
            Err(e) => warn!("uplink: session setup failed ({})", e),
        }
    }

    fn poll_inbound(&mut self) {
        let Connection::SessionUp(session) = &mut self.conn else {
            return;
        };
        let topics = &self.topics;
        let pending = &mut self.pending;
        let result = session.poll(&mut |topic, payload| {
            if let Some(cmd) = inbound::decode(topics, topic, payload) {
                Self::enqueue(pending, cmd);
            }
        });
        if let Err(e) = result {
            self.drop_session(e);
        }
    }

    fn publish(&mut self, topic: &str, payload: &str) -> bool {
        let Connection::SessionUp(session) = &mut self.conn else {
            return false;
        };
        let result = session.publish(topic, payload.as_bytes(), true);
        match result {
            Ok(()) => true,
            Err(e) => {
                self.drop_session(e);
                false
            }
        }
    }

    fn take_command(&mut self) -> Option<InboundCommand> {
        self.pending.pop_front()
    }

    fn has_session(&self) -> bool {
        matches!(self.conn, Connection::SessionUp(_))
    }
}
