//! Fuzz target: persisted record loading
//!
//! Stores arbitrary bytes under both record keys, then boots the records
//! layer on top. Loading must never panic, must return in-range values
//! and must leave a record behind that decodes cleanly.
//!
//! cargo fuzz run fuzz_records

#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use pumpctl::app::ports::{StorageError, StoragePort};
use pumpctl::storage::records::{self, RuntimeSnapshot, ThresholdPair, RUNTIME_KEY, THRESHOLDS_KEY};

// ── In-memory StoragePort for fuzz testing ────────────────────

#[derive(Default)]
struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self.data.get(key).ok_or(StorageError::NotFound)?;
        let n = v.len().min(buf.len());
        buf[..n].copy_from_slice(&v[..n]);
        Ok(n)
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |&b| usize::from(b)).min(data.len());
    let (a, b) = data.split_at(split);

    let mut store = MemStore::default();
    store.data.insert(THRESHOLDS_KEY.to_string(), a.to_vec());
    store.data.insert(RUNTIME_KEY.to_string(), b.to_vec());

    let pair = records::load_thresholds(&mut store, ThresholdPair::DEFAULT);
    assert!(pair.is_valid());

    let snap = records::load_runtime(&mut store);
    assert!(snap.minutes < 60 && snap.hours < 24);

    let stored = String::from_utf8_lossy(&store.data[RUNTIME_KEY]).into_owned();
    assert!(RuntimeSnapshot::decode(&stored).is_some() || stored.len() > 48);
});
