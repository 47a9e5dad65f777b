//! Persisted records: the threshold pair and cumulative pump runtime.
//!
//! Both are stored as short `|`-delimited text records so a truncated
//! write is detectable on the next boot. Any record that is missing,
//! unreadable or malformed is replaced by its default, and the default is
//! written back immediately.
//!
//! | Key          | Format                       |
//! |--------------|------------------------------|
//! | `thresholds` | `"<low>\|<high>"` (`4.0\|5.0`) |
//! | `runtime`    | `"<minutes>\|<hours>\|<days>"` |

use core::fmt::Write;

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};

pub const THRESHOLDS_KEY: &str = "thresholds";
pub const RUNTIME_KEY: &str = "runtime";

/// Longest record either codec produces, with headroom.
pub const RECORD_CAP: usize = 48;

pub type Record = heapless::String<RECORD_CAP>;

// ═══════════════════════════════════════════════════════════════
//  Threshold pair
// ═══════════════════════════════════════════════════════════════

/// Low/high pressure thresholds in bar.
///
/// `low < high` is expected but not enforced; only positivity is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPair {
    pub low: f32,
    pub high: f32,
}

impl ThresholdPair {
    pub const DEFAULT: Self = Self { low: 4.0, high: 5.0 };

    /// Both values finite and strictly positive.
    pub fn new(low: f32, high: f32) -> Option<Self> {
        let pair = Self { low, high };
        pair.is_valid().then_some(pair)
    }

    pub fn is_valid(&self) -> bool {
        is_positive(self.low) && is_positive(self.high)
    }

    pub fn encode(&self) -> Record {
        let mut s = Record::new();
        // `{:?}` keeps the trailing `.0` on whole numbers.
        let _ = write!(s, "{:?}|{:?}", self.low, self.high);
        s
    }

    /// Parse `"<low>|<high>"`; exactly two positive float fields.
    pub fn decode(text: &str) -> Option<Self> {
        let mut fields = text.trim().split('|');
        let low = fields.next()?.trim().parse::<f32>().ok()?;
        let high = fields.next()?.trim().parse::<f32>().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Self::new(low, high)
    }
}

impl Default for ThresholdPair {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

// ═══════════════════════════════════════════════════════════════
//  Runtime snapshot
// ═══════════════════════════════════════════════════════════════

/// The durable part of the pump runtime accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeSnapshot {
    pub minutes: u32,
    pub hours: u32,
    pub days: u32,
}

impl RuntimeSnapshot {
    pub fn encode(&self) -> Record {
        let mut s = Record::new();
        let _ = write!(s, "{}|{}|{}", self.minutes, self.hours, self.days);
        s
    }

    /// Parse `"<minutes>|<hours>|<days>"` with in-range carry fields.
    pub fn decode(text: &str) -> Option<Self> {
        let mut fields = text.trim().split('|');
        let minutes = fields.next()?.trim().parse::<u32>().ok()?;
        let hours = fields.next()?.trim().parse::<u32>().ok()?;
        let days = fields.next()?.trim().parse::<u32>().ok()?;
        if fields.next().is_some() || minutes >= 60 || hours >= 24 {
            return None;
        }
        Some(Self { minutes, hours, days })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Load / save
// ═══════════════════════════════════════════════════════════════

/// Load thresholds, substituting and persisting `defaults` on any failure.
pub fn load_thresholds(store: &mut impl StoragePort, defaults: ThresholdPair) -> ThresholdPair {
    if let Some(pair) = read_record(store, THRESHOLDS_KEY).and_then(|r| ThresholdPair::decode(&r)) {
        info!("records: thresholds low={:.1} high={:.1}", pair.low, pair.high);
        return pair;
    }
    warn!("records: no valid thresholds, writing defaults {}", defaults.encode());
    if let Err(e) = save_thresholds(store, &defaults) {
        warn!("records: default thresholds not persisted: {}", e);
    }
    defaults
}

pub fn save_thresholds(store: &mut impl StoragePort, pair: &ThresholdPair) -> Result<(), StorageError> {
    store.write(THRESHOLDS_KEY, pair.encode().as_bytes())
}

/// Load runtime totals, substituting and persisting zero on any failure.
pub fn load_runtime(store: &mut impl StoragePort) -> RuntimeSnapshot {
    if let Some(snap) = read_record(store, RUNTIME_KEY).and_then(|r| RuntimeSnapshot::decode(&r)) {
        info!("records: runtime {}m {}h {}d", snap.minutes, snap.hours, snap.days);
        return snap;
    }
    let zero = RuntimeSnapshot::default();
    warn!("records: no valid runtime record, writing {}", zero.encode());
    if let Err(e) = save_runtime(store, &zero) {
        warn!("records: default runtime not persisted: {}", e);
    }
    zero
}

pub fn save_runtime(store: &mut impl StoragePort, snap: &RuntimeSnapshot) -> Result<(), StorageError> {
    store.write(RUNTIME_KEY, snap.encode().as_bytes())
}

fn read_record(store: &impl StoragePort, key: &str) -> Option<Record> {
    let mut buf = [0u8; RECORD_CAP];
    let len = match store.read(key, &mut buf) {
        Ok(len) => len,
        Err(e) => {
            info!("records: '{}' unavailable ({})", key, e);
            return None;
        }
    };
    let Ok(text) = core::str::from_utf8(&buf[..len]) else {
        warn!("records: '{}' is not UTF-8", key);
        return None;
    };
    let mut record = Record::new();
    record.push_str(text).ok()?;
    Some(record)
}
