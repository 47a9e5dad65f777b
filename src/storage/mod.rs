//! Persisted device state on top of [`StoragePort`](crate::app::ports::StoragePort).

pub mod records;
