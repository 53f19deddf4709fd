//! Department/dependency document (`dependencies.yaml`)
//!
//! ```yaml
//! departments:
//!   - id: animation
//!     name: Animation
//!     statuses: [not_started, in_progress, review, approved]
//!     requires:
//!       - { department: layout, status: approved }
//!       - { department: rigging, status: approved, blocking: false }
//!     produces:
//!       - { type: cache, format: [abc, usd], location: cache_path }
//! workflows:
//!   default:
//!     asset_types: { character: { sequence: [modeling, rigging, shading] } }
//!     shot_types:  { standard:  { sequence: [layout, animation, lighting] } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BifrostError, Result};
use crate::util::constants::{DEFAULT_REQUIRED_STATUS, DEPENDENCIES_FILE};

/// Root of `dependencies.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesDoc {
    pub departments: Vec<DepartmentDoc>,
    /// Named workflows (`default`, `lightweight`, ...)
    #[serde(default)]
    pub workflows: BTreeMap<String, WorkflowDoc>,
}

impl DependenciesDoc {
    pub fn parse(yaml: &str) -> Result<Self> {
        let doc: Self = serde_yaml::from_str(yaml)?;
        if doc.departments.is_empty() {
            return Err(BifrostError::ConfigLoad {
                document: DEPENDENCIES_FILE.to_string(),
                reason: "'departments' is empty".to_string(),
            });
        }
        Ok(doc)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepartmentDoc {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered status set; defaults to the standard four
    #[serde(default)]
    pub statuses: Option<Vec<String>>,
    #[serde(default)]
    pub default_status: Option<String>,
    #[serde(default)]
    pub requires: Vec<RequirementDoc>,
    #[serde(default)]
    pub produces: Vec<OutputDoc>,
}

/// `dependent -> required` edge as written under `requires:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementDoc {
    pub department: String,
    #[serde(default = "default_required_status")]
    pub status: String,
    #[serde(default = "default_blocking")]
    pub blocking: bool,
}

fn default_required_status() -> String {
    DEFAULT_REQUIRED_STATUS.to_string()
}

fn default_blocking() -> bool {
    true
}

/// Something a department hands downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDoc {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, alias = "formats")]
    pub format: Formats,
    /// Path type the output lands in
    #[serde(default)]
    pub location: Option<String>,
}

/// Single format or list of formats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Formats {
    One(String),
    Many(Vec<String>),
}

impl Default for Formats {
    fn default() -> Self {
        Formats::Many(Vec::new())
    }
}

impl Formats {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Formats::One(f) => vec![f.clone()],
            Formats::Many(v) => v.clone(),
        }
    }
}

/// One named workflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowDoc {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub asset_types: BTreeMap<String, SequenceDoc>,
    #[serde(default)]
    pub shot_types: BTreeMap<String, SequenceDoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDoc {
    pub sequence: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}
