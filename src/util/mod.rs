//! Utilities Module - shared infrastructure
//!
//! - `constants`: Standard variable vocabulary, default statuses, scan limits
//! - `interner`: Identifier interning (studio, department, variable names)

pub mod constants;
mod interner;

pub use constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_SCAN_TIMEOUT, DEFAULT_STATUSES, STANDARD_VARIABLES};
pub use interner::{intern, Interner};
#[cfg(test)]
pub(crate) use interner::is_interned;
