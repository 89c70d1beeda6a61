// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The table of live receiver endpoints.

use std::net::SocketAddrV4;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use hashbrown::HashMap;

/// Soft-state membership table mapping each receiver endpoint to the time of
/// its last beacon. At most one entry exists per `(addr, port)` pair.
///
/// One mutex serializes all mutation and iteration. The entry count is
/// mirrored into an atomic so the ingest path can ask [`TargetTable::is_empty`]
/// without taking the lock; that answer may be stale by one beacon or one
/// prune, which callers tolerate (a stale "empty" skips at most the first few
/// lines after the very first beacon, a stale "non-empty" wastes one framing
/// pass).
#[derive(Debug, Default)]
pub struct TargetTable {
    entries: Mutex<HashMap<SocketAddrV4, Instant>>,
    len: AtomicUsize,
}

impl TargetTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a beacon from `target`: refresh its timestamp if it is already
    /// known, insert it otherwise. Idempotent.
    pub fn upsert(&self, target: SocketAddrV4, now: Instant) {
        #[allow(clippy::expect_used)]
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.insert(target, now);
        self.len.store(entries.len(), Ordering::Relaxed);
    }

    /// Drop every target whose last beacon is older than `max_age`. Returns
    /// the number of targets removed.
    pub fn prune(&self, now: Instant, max_age: Duration) -> usize {
        #[allow(clippy::expect_used)]
        let mut entries = self.entries.lock().expect("lock poisoned");
        let before = entries.len();
        entries.retain(|_, last_beacon| now.duration_since(*last_beacon) <= max_age);
        self.len.store(entries.len(), Ordering::Relaxed);
        before - entries.len()
    }

    /// Copy the current set of endpoints out under the lock. Order is
    /// unspecified.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SocketAddrV4> {
        #[allow(clippy::expect_used)]
        let entries = self.entries.lock().expect("lock poisoned");
        entries.keys().copied().collect()
    }

    /// Lock-free emptiness check; see the staleness note on the type.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len.load(Ordering::Relaxed) == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}
