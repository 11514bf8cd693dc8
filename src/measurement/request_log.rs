//! Bounded request log.
//!
//! # Responsibilities
//! - Record exactly one entry per routed request outcome
//! - Keep at most `capacity` entries, evicting the oldest first
//! - Hand out copies for the metrics engine and the status endpoint
//!
//! # Design Decisions
//! - Entries are immutable values; readers get a cloned snapshot, never a reference
//! - A timestamp older than the newest entry is clamped to it, so append order and
//!   time order always agree

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::clock::{unix_now, Timestamp};
use crate::routing::Replica;

/// Outcome of one routed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: Timestamp,
    pub status: u16,
    pub routed_to: Option<Replica>,
    pub target: Option<String>,
    pub note: Option<String>,
}

impl LogEntry {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug)]
pub struct RequestLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        // Entries are plain values; a panic elsewhere cannot leave one half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a fully-formed entry.
    pub fn append(&self, mut entry: LogEntry) {
        let mut entries = self.lock();
        if let Some(newest) = entries.back() {
            if entry.timestamp < newest.timestamp {
                entry.timestamp = newest.timestamp;
            }
        }
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Append an entry stamped with the current time.
    pub fn record(
        &self,
        status: u16,
        routed_to: Option<Replica>,
        target: Option<&str>,
        note: Option<&str>,
    ) {
        self.append(LogEntry {
            timestamp: unix_now(),
            status,
            routed_to,
            target: target.map(str::to_string),
            note: note.map(str::to_string),
        });
    }

    /// Copy of all retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
