//! Store Module - configuration snapshots
//!
//! Key types:
//! - `ConfigSources`: where the pipeline documents live
//! - `Snapshot`: registry + workflow engine compiled from one set of documents
//! - `SnapshotStore`: current snapshot behind a `parking_lot::RwLock<Arc<_>>`
//!
//! Readers clone the `Arc` under a momentary read lock and keep working on
//! it; `reload()` compiles a full snapshot off-lock and swaps the pointer.
//! A failed reload leaves the previous snapshot active.

mod snapshot;

pub use snapshot::{ConfigSources, Snapshot, SnapshotStore};
