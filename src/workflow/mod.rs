//! Workflow Module - department sequencing per entity type
//!
//! The engine owns the global department graph, one merged graph per
//! project, and the named workflow sequences. Sequence lookup for a
//! project:
//!
//! ```text
//! project *_workflows override → workflows[workflow_type] → workflows.default → WorkflowNotFound
//! ```

mod engine;

pub use engine::{EntityKind, ProjectWorkflows, Sequence, WorkflowEngine};
