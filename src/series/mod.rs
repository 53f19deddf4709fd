//! Series Module - episodic structure from `series_metadata.yaml`
//!
//! - `catalog`: episodes, sequences, shared elements, deliverables
//! - `numbering`: shot-id patterns (`SH{number:04d}`)
//!
//! The catalog feeds the `SERIES`/`EPISODE`/`SEQUENCE`/`SHOT` variables of
//! shot templates. A configuration without the document gets an empty
//! catalog that still numbers shots with the default pattern.

mod catalog;
mod numbering;

pub use catalog::{Deliverable, Episode, SeriesCatalog, SeriesSequence, SharedElement};
pub use numbering::ShotNumbering;
