//! Event Module - audit trail of pipeline operations
//!
//! Key types:
//! - `Event`: envelope with id + timestamp + kind
//! - `EventKind`: configuration, filesystem and workflow events
//! - `EventLog`: thread-safe, append-only log

mod log;

pub use log::{Event, EventKind, EventLog};
