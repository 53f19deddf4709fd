//! AST Module - serde types for the pipeline YAML documents
//!
//! Contains the raw shapes parsed from disk:
//! - `mapping`: FolderMappingDoc, StudioMappingDoc, VariableSpec (`folder_mapping.yaml`)
//! - `pipeline`: DependenciesDoc, DepartmentDoc, RequirementDoc (`dependencies.yaml`)
//! - `project`: ProjectDoc (`projects/<project>.yaml`)
//! - `series`: SeriesDoc (`series_metadata.yaml`, optional)
//!
//! These types are the "what" as written by a pipeline TD. They are validated
//! and compiled by `mapping`, `dag` and `series`; nothing outside those
//! builders should consume them directly.

mod mapping;
mod pipeline;
mod project;
mod series;

pub use mapping::{FolderMappingDoc, StudioMappingDoc, VariableKind, VariableSpec};
pub use pipeline::{
    DependenciesDoc, DepartmentDoc, Formats, OutputDoc, RequirementDoc, SequenceDoc, WorkflowDoc,
};
pub use project::{
    DepartmentOverride, ProjectDoc, ProjectPipeline, TaskTemplateOverride, WorkflowType,
};
pub use series::{
    DeliverableDoc, EpisodeDoc, NumberingDoc, SeriesDoc, SeriesSequenceDoc, SharedElementDoc,
};
