//! Live telemetry store shared between the poll, receive and actuator threads.
//!
//! Holds two independent slots:
//! - `local`: last reading acquired from our own sensor (written by the poll loop)
//! - `remote`: last reading received from the paired unit (written by the relay receiver)
//!
//! Each slot keeps the reading and an update sequence number behind a single
//! lock, so readers always see one complete reading.

use crate::core::types::Reading;
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe telemetry store handle.
pub type SharedTelemetry = Arc<TelemetryStore>;

/// A slot value together with its write metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub reading: Reading,
    /// Number of writes to this slot so far (first write is 1)
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct Slot {
    inner: RwLock<Option<Snapshot>>,
}

impl Slot {
    fn replace(&self, reading: Reading) -> u64 {
        let mut guard = self.inner.write();
        let sequence = guard.map_or(1, |s| s.sequence + 1);
        *guard = Some(Snapshot { reading, sequence });
        sequence
    }

    fn snapshot(&self) -> Option<Snapshot> {
        *self.inner.read()
    }
}

/// Latest known local and remote readings.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    local: Slot,
    remote: Slot,
}

impl TelemetryStore {
    /// Create an empty store (both slots unknown)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store wrapped for sharing between threads
    pub fn shared() -> SharedTelemetry {
        Arc::new(Self::new())
    }

    /// Replace the local reading, returns the new sequence number
    pub fn set_local(&self, reading: Reading) -> u64 {
        self.local.replace(reading)
    }

    /// Replace the remote reading, returns the new sequence number
    pub fn set_remote(&self, reading: Reading) -> u64 {
        self.remote.replace(reading)
    }

    /// Latest local reading, `None` before the first poll succeeded
    pub fn local(&self) -> Option<Reading> {
        self.local.snapshot().map(|s| s.reading)
    }

    /// Latest remote reading, `None` before the first message arrived
    pub fn remote(&self) -> Option<Reading> {
        self.remote.snapshot().map(|s| s.reading)
    }

    pub fn local_snapshot(&self) -> Option<Snapshot> {
        self.local.snapshot()
    }

    pub fn remote_snapshot(&self) -> Option<Snapshot> {
        self.remote.snapshot()
    }
}
