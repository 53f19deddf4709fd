//! Sync Module - keep the filesystem in line with resolved paths
//!
//! - `ensure`: idempotent directory creation, tolerant of concurrent callers
//! - `drift`: read-only comparison of expected vs on-disk directories, plus
//!   confirmed pruning of the extras it found
//!
//! Nothing in this module deletes a directory unless the caller hands back
//! a `PruneConfirmation` minted from the exact report being acted on.

mod drift;
mod ensure;

pub use drift::{
    prune_extra, scan_drift, scan_drift_with_timeout, DriftReport, DriftRequest, PruneConfirmation,
    PruneOutcome, ScanOptions,
};
pub use ensure::{ensure, EnsureOutcome};
