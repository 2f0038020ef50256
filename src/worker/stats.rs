use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::models::ErrorKind;

/// Counters of terminal message outcomes, shared by every worker of a pool.
#[derive(Debug, Default)]
pub struct WorkerStats {
    applied: AtomicU64,
    malformed: AtomicU64,
    not_found: AtomicU64,
    failed: AtomicU64
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub applied: u64,
    pub malformed: u64,
    pub not_found: u64,
    pub failed: u64
}

impl StatsSnapshot {
    pub fn total(&self) -> u64 {
        self.applied + self.malformed + self.not_found + self.failed
    }
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::MalformedMessage => &self.malformed,
            ErrorKind::AccountNotFound => &self.not_found,
            _ => &self.failed
        };

        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            applied: self.applied.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed)
        }
    }
}
