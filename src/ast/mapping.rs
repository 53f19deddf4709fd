//! Folder mapping document (`folder_mapping.yaml`)
//!
//! ```yaml
//! default_studio: main_studio
//! implicit_variables: true
//! variables:
//!   VERSION: { type: string, pattern: "^v[0-9]{3}$" }
//!   LAYER:   { required: false }
//! studio_mappings:
//!   main_studio:
//!     display_name: Main Studio
//!     templates:
//!       asset_published_path: "{PROJECT}/assets/{ASSET_TYPE}/{ASSET_NAME}/published/{VERSION}/"
//!   partner:
//!     parent: main_studio
//!     templates: {}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::ContextValue;
use crate::error::{BifrostError, Result};

/// Declared type of a template variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    String,
    Integer,
    Enum,
    Date,
    Boolean,
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VariableKind::String => "string",
            VariableKind::Integer => "integer",
            VariableKind::Enum => "enum",
            VariableKind::Date => "date",
            VariableKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Variable declaration as written in YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Regex the rendered value must match
    #[serde(default, alias = "validation_pattern")]
    pub pattern: Option<String>,
    /// Allowed values (enum variables)
    #[serde(default, alias = "allowed_values")]
    pub values: Option<Vec<String>>,
    #[serde(default, alias = "default_value")]
    pub default: Option<ContextValue>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_required() -> bool {
    true
}

/// One studio's block under `studio_mappings:`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudioMappingDoc {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSpec>,
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// Path types this studio must define, directly or through its parents
    #[serde(default)]
    pub required_path_types: Vec<String>,
}

/// Root of `folder_mapping.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderMappingDoc {
    pub default_studio: String,
    #[serde(default = "default_implicit")]
    pub implicit_variables: bool,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSpec>,
    pub studio_mappings: BTreeMap<String, StudioMappingDoc>,
    /// Path types every studio must define
    #[serde(default)]
    pub required_path_types: Vec<String>,
}

fn default_implicit() -> bool {
    true
}

impl FolderMappingDoc {
    pub fn parse(yaml: &str) -> Result<Self> {
        let doc: Self = serde_yaml::from_str(yaml)?;
        if doc.studio_mappings.is_empty() {
            return Err(BifrostError::ConfigLoad {
                document: crate::util::constants::FOLDER_MAPPING_FILE.to_string(),
                reason: "'studio_mappings' is empty".to_string(),
            });
        }
        Ok(doc)
    }
}
