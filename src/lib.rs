//! Bifrost - studio path templates, folder sync and department gating
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       YAML → Rust types (FolderMappingDoc, ...)        │
//! │  context    Entity attributes (Context, ContextValue)        │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  template/  Path templates (TemplateParser, TemplatePath)    │
//! │  mapping/   Studio registry (MappingRegistry)                │
//! │  resolve/   Context → path (Resolver, Translator)            │
//! │  dag/       Department graph (DepartmentGraph, gating)       │
//! │  workflow/  Sequences per entity type (WorkflowEngine)       │
//! │  series/    Episodes and shot numbering (SeriesCatalog)      │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  sync/      Directory creation, drift scan, confirmed prune  │
//! │  store/     Config snapshots (SnapshotStore)                 │
//! │  event/     Audit trail (EventLog, EventKind)                │
//! │  util/      Utilities (interner, constants)                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | `folder_mapping.yaml`, `dependencies.yaml`, project documents |
//! | [`template`] | Tokenizing, `${section.key}` expansion, variable constraints |
//! | [`mapping`] | Studio inheritance and `(studio, path_type)` lookup |
//! | [`resolve`] | Substitution and per-platform normalization |
//! | [`dag`] | Dependency graph with FxHashMap, cycle detection, gates |
//! | [`workflow`] | Workflow sequences, project overrides, task templates |
//! | [`series`] | Episodes, sequences, shared elements, shot ids |
//! | [`sync`] | Filesystem side: `ensure`, `scan_drift`, `prune_extra` |
//! | [`store`] | Atomic snapshot swap with last-good fallback |
//! | [`service`] | `Bifrost` facade over the active snapshot |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - YAML → Rust types
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod context;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Templates, resolution, gating
// ═══════════════════════════════════════════════════════════════
pub mod dag;
pub mod mapping;
pub mod resolve;
pub mod series;
pub mod template;
pub mod workflow;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Filesystem, snapshots, events
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod service;
pub mod store;
pub mod sync;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{BifrostError, FixSuggestion, Result};

// Config types
pub use config::BifrostConfig;

// Domain types
pub use context::{Context, ContextBuilder, ContextValue};

// Paths
pub use mapping::{MappingRegistry, StudioMapping};
pub use resolve::{Platform, ResolvedPath, Resolver, Translation, Translator};
pub use template::{TemplateParser, TemplatePath};

// Filesystem
pub use sync::{DriftReport, EnsureOutcome, PruneConfirmation, PruneOutcome, ScanOptions};

// Workflow
pub use dag::{DepartmentGraph, GateDecision, StatusSource};
pub use workflow::{EntityKind, WorkflowEngine};

// Series
pub use series::{SeriesCatalog, ShotNumbering};

// Infrastructure
pub use event::{Event, EventKind, EventLog};
pub use service::Bifrost;
pub use store::{ConfigSources, Snapshot, SnapshotStore};
