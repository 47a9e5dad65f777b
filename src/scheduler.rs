//! Cooperative multi-timer scheduler.
//!
//! A fixed set of periodic tasks on a wrapping millisecond tick. The
//! scheduler only tracks intervals; when a task is due it calls the
//! [`SchedulerDelegate`], which owns the task bodies.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  main loop ── poll(now) ──▶ Scheduler                      │
//! │                               │  elapsed > interval ?      │
//! │                               ▼                            │
//! │                    SchedulerDelegate::on_task_due          │
//! │                               │                            │
//! │         ┌──────────────┬──────┴───────┬──────────────┐     │
//! │         ▼              ▼              ▼              ▼     │
//! │   RuntimePersist  Connectivity   DataPublish     Sampling  │
//! │      60 s            5 s            2 s           200 ms   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Elapsed time is `now.wrapping_sub(last_fire)`, so a tick counter that
//! rolls over at `u32::MAX` never stalls or bursts a task.

use crate::app::ports::SchedulerDelegate;
use crate::config::SystemConfig;
use crate::error::Fault;
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════
//  Task identity
// ═══════════════════════════════════════════════════════════════

/// The periodic tasks the controller runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    RuntimePersist,
    ConnectivityCheck,
    DataPublish,
    Sampling,
}

impl TaskId {
    pub fn label(self) -> &'static str {
        match self {
            Self::RuntimePersist => "runtime-persist",
            Self::ConnectivityCheck => "connectivity",
            Self::DataPublish => "data-publish",
            Self::Sampling => "sampling",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of periodic tasks (stack-allocated).
pub const MAX_TASKS: usize = 4;

#[derive(Debug, Clone, Copy)]
struct PeriodicTask {
    id: TaskId,
    interval_ms: u32,
    last_fire: u32,
}

pub struct Scheduler {
    tasks: heapless::Vec<PeriodicTask, MAX_TASKS>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    /// The four controller tasks in their fixed order.
    pub fn from_config(cfg: &SystemConfig, now: u32) -> Self {
        let mut sched = Self::new();
        sched.add(TaskId::RuntimePersist, cfg.runtime_persist_interval_ms, now);
        sched.add(TaskId::ConnectivityCheck, cfg.connectivity_check_interval_ms, now);
        sched.add(TaskId::DataPublish, cfg.data_publish_interval_ms, now);
        sched.add(TaskId::Sampling, cfg.sampling_interval_ms, now);
        sched
    }

    /// Register a task that first fires one interval after `now`.
    /// Returns `false` when all slots are taken.
    pub fn add(&mut self, id: TaskId, interval_ms: u32, now: u32) -> bool {
        let task = PeriodicTask {
            id,
            interval_ms,
            last_fire: now,
        };
        if self.tasks.push(task).is_err() {
            warn!("Scheduler: no slot for '{}'", id.label());
            return false;
        }
        info!("Scheduler: '{}' every {} ms", id.label(), interval_ms);
        true
    }

    /// Run every task whose interval has strictly elapsed, in
    /// registration order.
    ///
    /// A fault from the delegate stops the poll and is returned as-is;
    /// tasks later in the order are not run this round.
    pub fn poll(&mut self, now: u32, delegate: &mut dyn SchedulerDelegate) -> Result<(), Fault> {
        for task in self.tasks.iter_mut() {
            if elapsed_ms(now, task.last_fire) > task.interval_ms {
                task.last_fire = now;
                debug!("Scheduler: '{}' due", task.id.label());
                delegate.on_task_due(task.id, now)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Milliseconds from `since` to `now` on a `u32` tick that wraps.
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
