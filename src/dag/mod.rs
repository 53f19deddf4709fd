//! DAG Module - department dependency graph
//!
//! - `department`: Department, DepartmentDependency, Output
//! - `graph`: DepartmentGraph (global or project-merged), cycle detection
//! - `gate`: StatusSource, GateDecision (can this department start?)
//!
//! Edges point from the dependent department to the one it requires:
//!
//! ```text
//! lighting ──requires(approved)──▶ animation ──requires(approved)──▶ layout
//! ```
//!
//! A DepartmentGraph is immutable after construction. Project overrides
//! produce a new graph sharing the department table with the global one.

mod department;
mod gate;
mod graph;

pub use department::{Department, DepartmentDependency, Output};
pub use gate::{GateDecision, StatusSource, UnmetRequirement};
pub use graph::{DepVec, DepartmentGraph};
