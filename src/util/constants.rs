//! Centralized constants for Bifrost
//!
//! Vocabulary, defaults and limits in one place for easy tuning.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// Template Vocabulary
// ═══════════════════════════════════════════════════════════════

/// Variables every folder-mapping document may use without declaring them
pub const STANDARD_VARIABLES: &[&str] = &[
    "ROOT",
    "PROJECT",
    "ASSET_TYPE",
    "ASSET_NAME",
    "VERSION",
    "DEPARTMENT",
    "USER",
    "SERIES",
    "EPISODE",
    "SEQUENCE",
    "SHOT",
    "LAYER",
    "CACHE_TYPE",
    "DELIVERABLE_TYPE",
    "TASK",
    "DATE",
];

/// Variables that locate a project tree rather than an entity inside it.
///
/// A drift scan is rooted at the end of the leading run of template segments
/// built only from literals and these variables.
pub const ROOT_VARIABLES: &[&str] = &["ROOT", "PROJECT"];

// ═══════════════════════════════════════════════════════════════
// Department Defaults
// ═══════════════════════════════════════════════════════════════

/// Status lifecycle for departments that do not declare their own
pub const DEFAULT_STATUSES: &[&str] = &["not_started", "in_progress", "review", "approved"];

/// Status a requirement asks for when the document omits it
pub const DEFAULT_REQUIRED_STATUS: &str = "approved";

/// Workflow used when a project selects none (or a custom one without a match)
pub const DEFAULT_WORKFLOW: &str = "default";

// ═══════════════════════════════════════════════════════════════
// Filesystem
// ═══════════════════════════════════════════════════════════════

/// Upper bound for a drift scan when the caller gives no timeout
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(120);

/// Events kept by the in-memory log before the oldest are evicted
pub const DEFAULT_EVENT_CAPACITY: usize = 10_000;

/// Default document file names inside the pipeline config directory
pub const DEPENDENCIES_FILE: &str = "dependencies.yaml";
pub const FOLDER_MAPPING_FILE: &str = "folder_mapping.yaml";
pub const PROJECTS_DIR: &str = "projects";
/// Optional episodic metadata next to the other documents
pub const SERIES_FILE: &str = "series_metadata.yaml";

// ═══════════════════════════════════════════════════════════════
// Series
// ═══════════════════════════════════════════════════════════════

/// Shot-id pattern used when the series document sets none
pub const DEFAULT_SHOT_PATTERN: &str = "SH{number:04d}";

// ═══════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════
