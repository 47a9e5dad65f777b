//! Cumulative pump-on time.
//!
//! Seconds carry into minutes, minutes into hours, hours into days, with
//! full integer carry so one long run lands in the right fields. Only the
//! minute/hour/day part is durable; see [`RuntimeSnapshot`].

use crate::storage::records::RuntimeSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeAccumulator {
    seconds: u32,
    minutes: u32,
    hours: u32,
    days: u32,
}

impl RuntimeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted snapshot; seconds restart at zero.
    ///
    /// Out-of-range fields are normalised through the same carry chain.
    pub fn from_snapshot(snap: RuntimeSnapshot) -> Self {
        let mut acc = Self {
            days: snap.days,
            ..Self::default()
        };
        acc.carry_minutes(u64::from(snap.hours) * 60 + u64::from(snap.minutes));
        acc
    }

    /// Add a finished run of `elapsed_secs`.
    ///
    /// Returns the new snapshot when at least one minute carried, i.e.
    /// when the durable part changed.
    pub fn tick(&mut self, elapsed_secs: u32) -> Option<RuntimeSnapshot> {
        let total = u64::from(self.seconds) + u64::from(elapsed_secs);
        self.seconds = (total % 60) as u32;
        let carried = total / 60;
        if carried == 0 {
            return None;
        }
        self.carry_minutes(carried);
        Some(self.snapshot())
    }

    fn carry_minutes(&mut self, add: u64) {
        let minutes = u64::from(self.minutes) + add;
        self.minutes = (minutes % 60) as u32;
        let hours = u64::from(self.hours) + minutes / 60;
        self.hours = (hours % 24) as u32;
        let days = u32::try_from(hours / 24).unwrap_or(u32::MAX);
        self.days = self.days.saturating_add(days);
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            minutes: self.minutes,
            hours: self.hours,
            days: self.days,
        }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }
}
