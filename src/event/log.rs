//! EventLog - append-only audit trail
//!
//! - Event: envelope with id + timestamp + kind
//! - EventKind: configuration, filesystem and workflow variants
//! - EventLog: thread-safe, bounded, cheap to clone (shared storage)
//!
//! The log keeps the newest `capacity` events. Older ones are evicted and
//! counted in [`EventLog::dropped`]; long-running callers export them with
//! [`EventLog::drain`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::DEFAULT_EVENT_CAPACITY;

/// Single event in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since the log was created (ms)
    pub timestamp_ms: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // CONFIGURATION
    // ═══════════════════════════════════════════
    SnapshotLoaded {
        generation: u64,
        /// xxh3 of the source documents
        fingerprint: String,
        studios: usize,
        departments: usize,
        projects: usize,
    },
    /// A reload failed; the previous snapshot stays active
    ReloadRejected {
        active_generation: u64,
        code: String,
        error: String,
    },

    // ═══════════════════════════════════════════
    // FILESYSTEM
    // ═══════════════════════════════════════════
    DirectoriesCreated {
        path: String,
        created: Vec<String>,
    },
    DriftScanned {
        studio: Arc<str>,
        path_type: Arc<str>,
        missing: usize,
        extra: usize,
        fingerprint: String,
    },
    ExtraPruned {
        studio: Arc<str>,
        path_type: Arc<str>,
        removed: Vec<String>,
    },

    // ═══════════════════════════════════════════
    // PATHS / WORKFLOW
    // ═══════════════════════════════════════════
    PathTranslated {
        path_type: Arc<str>,
        from_studio: Arc<str>,
        to_studio: Arc<str>,
        from: String,
        to: String,
    },
    GateEvaluated {
        project: Option<Arc<str>>,
        entity: String,
        department: Arc<str>,
        allowed: bool,
        unmet: Vec<Arc<str>>,
    },
}

impl EventKind {
    /// Events that describe a change on disk
    pub fn is_filesystem_event(&self) -> bool {
        matches!(
            self,
            EventKind::DirectoriesCreated { .. } | EventKind::ExtraPruned { .. }
        )
    }

    pub fn is_config_event(&self) -> bool {
        matches!(
            self,
            EventKind::SnapshotLoaded { .. } | EventKind::ReloadRejected { .. }
        )
    }
}

/// Thread-safe ring of the most recent events
///
/// Clones share the same storage.
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<Event>>>,
    capacity: usize,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Log keeping at most `capacity` events (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        let mut events = self.events.write();
        if events.len() == self.capacity {
            events.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        events.push_back(event);
        id
    }

    /// Get the retained events, oldest first (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().iter().cloned().collect()
    }

    /// Zero-copy access to events via callback
    ///
    /// Holds the read lock for the duration of the callback.
    pub fn with_events<T>(&self, f: impl FnOnce(&VecDeque<Event>) -> T) -> T {
        f(&self.events.read())
    }

    /// Take every retained event, leaving the log empty
    ///
    /// Ids keep counting from where they were.
    pub fn drain(&self) -> Vec<Event> {
        self.events.write().drain(..).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events evicted to stay within capacity
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Events that changed the filesystem
    pub fn filesystem_events(&self) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.is_filesystem_event())
                .cloned()
                .collect()
        })
    }

    /// Serialize to JSON for export
    pub fn to_json(&self) -> Value {
        self.with_events(|events| serde_json::to_value(events).unwrap_or(Value::Null))
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("dropped", &self.dropped())
            .finish()
    }
}
