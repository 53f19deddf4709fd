//! Series metadata document (`series_metadata.yaml`)
//!
//! ```yaml
//! series:
//!   name: Sky Pirates
//!   code: SKP
//!   numbering:
//!     shot_pattern: "SH{number:04d}"
//!   episodes:
//!     - id: ep01
//!       name: Pilot
//!       sequences:
//!         - { id: seq001, name: Opening, shots: [SH0010, SH0020] }
//!   shared_elements:
//!     - { type: character, name: Captain, id: captain, applies_to: [ep01, ep02] }
//!   deliverables:
//!     - { name: broadcast, format: mov, resolution: 1920x1080, frame_rate: 24 }
//! ```
//!
//! The body may also sit at the top level without the `series:` key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesDoc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub numbering: NumberingDoc,
    #[serde(default)]
    pub episodes: Vec<EpisodeDoc>,
    #[serde(default)]
    pub shared_elements: Vec<SharedElementDoc>,
    #[serde(default)]
    pub deliverables: Vec<DeliverableDoc>,
}

impl SeriesDoc {
    pub fn parse(yaml: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let body = match value.get("series") {
            Some(inner) => inner.clone(),
            None => value,
        };
        Ok(serde_yaml::from_value(body)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumberingDoc {
    /// e.g. `SH{number:04d}`; `{episode}` and `{sequence}` are also accepted
    #[serde(default)]
    pub shot_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeDoc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub sequences: Vec<SeriesSequenceDoc>,
}

/// Sequence entry of an episode; keys other than these are kept as-is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSequenceDoc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shots: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedElementDoc {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub id: String,
    /// Episode ids the element appears in
    #[serde(default)]
    pub applies_to: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverableDoc {
    pub name: String,
    pub format: String,
    pub resolution: String,
    pub frame_rate: f64,
}
