//! Project override document (`projects/<project>.yaml`)
//!
//! Fields sit either at the top level or under a `pipeline:` key:
//!
//! ```yaml
//! pipeline:
//!   workflow_type: custom
//!   custom_department_dependencies:
//!     lighting:
//!       requires:
//!         - { department: animation, status: approved }
//!   shot_workflows:
//!     standard: { sequence: [layout, animation, lighting] }
//!
//! task_templates:
//!   lighting:
//!     name_template: "{SHOT}_lighting"
//!     estimated_hours: 6
//!     priority: high
//! ```
//!
//! `task_templates` is read from either level as well.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pipeline::{RequirementDoc, SequenceDoc};
use crate::error::Result;

/// Which named global workflow supplies a project's base sequences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowType {
    #[default]
    Default,
    Lightweight,
    Custom,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::Default => "default",
            WorkflowType::Lightweight => "lightweight",
            WorkflowType::Custom => "custom",
        }
    }
}

impl From<String> for WorkflowType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => WorkflowType::Default,
            "lightweight" => WorkflowType::Lightweight,
            _ => WorkflowType::Custom,
        }
    }
}

impl From<WorkflowType> for String {
    fn from(t: WorkflowType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replacement requirement list for one department
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentOverride {
    #[serde(default)]
    pub requires: Vec<RequirementDoc>,
}

/// Per-department defaults for tasks created in a project
///
/// Every field is optional; an absent field keeps the studio default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplateOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Pipeline overrides of one project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPipeline {
    #[serde(default)]
    pub workflow_type: WorkflowType,
    #[serde(default)]
    pub custom_department_dependencies: BTreeMap<String, DepartmentOverride>,
    #[serde(default)]
    pub asset_workflows: BTreeMap<String, SequenceDoc>,
    #[serde(default)]
    pub shot_workflows: BTreeMap<String, SequenceDoc>,
    #[serde(default)]
    pub task_templates: BTreeMap<String, TaskTemplateOverride>,
}

/// Parsed project document
#[derive(Debug, Clone)]
pub struct ProjectDoc {
    pub name: String,
    pub pipeline: ProjectPipeline,
}

impl ProjectDoc {
    /// Parse a project document; `name` is the file stem
    pub fn parse(name: &str, yaml: &str) -> Result<Self> {
        let mut value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            value = serde_yaml::Value::Mapping(Default::default());
        }
        let (body, outer_templates) = match value.get("pipeline") {
            Some(inner) => (inner.clone(), value.get("task_templates").cloned()),
            None => (value, None),
        };
        let mut pipeline: ProjectPipeline = serde_yaml::from_value(body)?;
        if let Some(templates) = outer_templates {
            let outer: BTreeMap<String, TaskTemplateOverride> = serde_yaml::from_value(templates)?;
            pipeline.task_templates.extend(outer);
        }
        Ok(Self {
            name: name.to_string(),
            pipeline,
        })
    }
}
