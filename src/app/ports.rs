//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor, relay, storage, Wi-Fi, MQTT) implement these
//! traits. The [`AppService`](super::service::AppService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Error types are split by recovery policy: link, session and storage
//! errors are absorbed by the component that owns the I/O, while
//! [`SensorError`] and [`ActuatorError`] propagate as a [`Fault`].

use crate::app::commands::InboundCommand;
use crate::error::{ActuatorError, Fault, SensorError};
use crate::scheduler::TaskId;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the analog pressure transducer.
pub trait SensorPort {
    /// One raw ADC conversion, no filtering.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the pump relay.
pub trait ActuatorPort {
    /// Energise (`true`) or release (`false`) the pump relay.
    fn set_relay(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Flat key-addressed storage, one record per logical name.
///
/// Writes replace the whole record but are not guaranteed atomic across
/// power loss; readers must tolerate truncated or mixed content.
pub trait StoragePort {
    /// Read a record. Returns the number of bytes written to `buf`.
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Overwrite a record.
    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Clock / restart ports
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond tick that wraps at `u32::MAX`.
pub trait ClockPort {
    fn ticks_ms(&self) -> u32;
}

/// Full device reset.
pub trait RestartPort {
    /// On hardware this never returns.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Network link + messaging session ports
// ───────────────────────────────────────────────────────────────

/// Network layer below the messaging session (Wi-Fi station).
pub trait LinkPort {
    fn is_connected(&self) -> bool;

    /// Start (or restart) association. May return before the link is up.
    fn connect(&mut self) -> Result<(), LinkError>;
}

/// Factory for messaging sessions (MQTT broker connections).
pub trait MessagingPort {
    type Session: SessionPort;

    fn open_session(&mut self) -> Result<Self::Session, SessionError>;
}

/// An established publish/subscribe session. Dropping it closes it.
pub trait SessionPort {
    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError>;

    /// Hand every buffered inbound message to `on_message`.
    fn poll(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) -> Result<(), SessionError>;
}

/// What the application needs from connectivity, independent of the
/// link/session split.
pub trait UplinkPort {
    /// Bring the network link up if it is down.
    fn ensure_link(&mut self);

    /// Open a messaging session if the link is up and none exists.
    fn ensure_session(&mut self);

    /// Decode buffered inbound messages into pending commands.
    fn poll_inbound(&mut self);

    /// Retained publish. No-op returning `false` without a session.
    fn publish(&mut self, topic: &str, payload: &str) -> bool;

    /// Pop the oldest pending command.
    fn take_command(&mut self) -> Option<InboundCommand>;

    fn has_session(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, display).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from task bodies)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a task is due.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) only tracks intervals;
/// what a task does lives behind this trait.
pub trait SchedulerDelegate {
    /// Run `task` to completion. `now` is the tick the poll observed.
    fn on_task_due(&mut self, task: TaskId, now: u32) -> Result<(), Fault>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SystemConfig::validate`](crate::config::SystemConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`LinkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    NoCredentials,
    /// SSID or password fails length / charset checks.
    InvalidCredentials,
    ConnectionFailed,
}

/// Errors from [`MessagingPort`] / [`SessionPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    ConnectFailed,
    SubscribeFailed,
    PublishFailed,
    /// The broker or transport closed the session.
    Closed,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials invalid"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::Closed => write!(f, "session closed"),
        }
    }
}
