// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Bifrost Error Types with Error Codes
//!
//! Error code ranges:
//! - BIF-000-009: Configuration load errors
//! - BIF-010-019: Template errors
//! - BIF-020-029: Studio registry errors
//! - BIF-030-039: Resolution (per-request context) errors
//! - BIF-040-049: Filesystem sync errors
//! - BIF-050-059: Department graph / workflow errors
//!
//! Configuration-time errors (000-029, 050) are fatal: the snapshot that
//! produced them never becomes active.

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BifrostError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
#[diagnostic(url(docsrs))]
pub enum BifrostError {
    // ═══════════════════════════════════════════
    // CONFIG LOAD ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[BIF-001] Failed to load '{document}': {reason}")]
    #[diagnostic(
        code(bifrost::config_load),
        help("Fix the document; the previous configuration stays active")
    )]
    ConfigLoad { document: String, reason: String },

    #[error("[BIF-002] YAML parse error: {0}")]
    #[diagnostic(
        code(bifrost::yaml_parse),
        help("Check YAML syntax: indentation must be consistent, strings with braces need quoting")
    )]
    YamlParse(#[from] serde_yaml::Error),

    #[error("[BIF-003] IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("[BIF-004] Config error: {reason}")]
    ConfigError { reason: String },

    #[error("[BIF-005] JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════
    // TEMPLATE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[BIF-010] Template '{template}' references undeclared variable '{{{variable}}}'")]
    #[diagnostic(
        code(bifrost::undeclared_variable),
        help("Declare the variable under 'variables:' or use a name from the standard vocabulary")
    )]
    UndeclaredVariable { variable: String, template: String },

    #[error("[BIF-011] Template parse error in '{template}' at position {position}: {details}")]
    #[diagnostic(
        code(bifrost::template_parse),
        help("Placeholders look like {{ASSET_NAME}}: uppercase letters, digits and underscores")
    )]
    TemplateParse {
        template: String,
        position: usize,
        details: String,
    },

    #[error("[BIF-012] Invalid declaration for variable '{variable}': {reason}")]
    InvalidVariableDeclaration { variable: String, reason: String },

    // ═══════════════════════════════════════════
    // REGISTRY ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[BIF-020] Path type '{path_type}' is not defined for studio '{studio}' or its parents")]
    #[diagnostic(
        code(bifrost::path_type_not_found),
        help("Add the path type to the studio's templates or to its parent studio")
    )]
    PathTypeNotFound { studio: String, path_type: String },

    #[error("[BIF-021] Studio '{studio}' is not configured")]
    StudioNotFound { studio: String },

    #[error("[BIF-022] Studio inheritance cycle: {chain}")]
    InheritanceCycle { chain: String },

    #[error("[BIF-023] Invalid studio mapping '{studio}': {reason}")]
    InvalidStudioMapping { studio: String, reason: String },

    // ═══════════════════════════════════════════
    // RESOLUTION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[BIF-030] Missing required variable '{variable}' for '{path_type}' in studio '{studio}'")]
    #[diagnostic(
        code(bifrost::missing_variable),
        help("Add the variable to the context or declare a default for it")
    )]
    MissingVariable {
        variable: String,
        path_type: String,
        studio: String,
    },

    #[error("[BIF-031] Invalid value '{value}' for variable '{variable}': {reason}")]
    InvalidVariableValue {
        variable: String,
        value: String,
        reason: String,
    },

    // ═══════════════════════════════════════════
    // FILESYSTEM ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[BIF-040] Failed to sync '{path}': {source}")]
    #[diagnostic(
        code(bifrost::filesystem_sync),
        help("Check permissions and free space, then retry; partial creation is safe to retry")
    )]
    FilesystemSync {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[BIF-041] Drift scan of '{root}' cancelled: {reason}")]
    ScanCancelled { root: String, reason: String },

    #[error("[BIF-042] Prune confirmation does not match drift report (expected {expected}, got {actual})")]
    ConfirmationMismatch { expected: String, actual: String },

    // ═══════════════════════════════════════════
    // GRAPH / WORKFLOW ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[BIF-050] Cyclic department dependency{}: {cycle}", project.as_ref().map(|p| format!(" in project '{}'", p)).unwrap_or_default())]
    #[diagnostic(
        code(bifrost::cyclic_dependency),
        help("Remove one of the requirements along the cycle")
    )]
    CyclicDependency {
        cycle: String,
        project: Option<String>,
    },

    #[error("[BIF-051] Department '{department}' not found ({context})")]
    DepartmentNotFound { department: String, context: String },

    #[error("[BIF-052] Status '{status}' is not allowed for department '{department}'")]
    UnknownStatus { department: String, status: String },

    #[error("[BIF-053] No {kind} workflow for type '{entity_type}' in project '{project}'")]
    WorkflowNotFound {
        project: String,
        kind: String,
        entity_type: String,
    },
}

impl BifrostError {
    /// Get the error code (e.g., "BIF-001")
    pub fn code(&self) -> &'static str {
        match self {
            // Config load errors
            Self::ConfigLoad { .. } => "BIF-001",
            Self::YamlParse(_) => "BIF-002",
            Self::IoError(_) => "BIF-003",
            Self::ConfigError { .. } => "BIF-004",
            Self::JsonError(_) => "BIF-005",
            // Template errors
            Self::UndeclaredVariable { .. } => "BIF-010",
            Self::TemplateParse { .. } => "BIF-011",
            Self::InvalidVariableDeclaration { .. } => "BIF-012",
            // Registry errors
            Self::PathTypeNotFound { .. } => "BIF-020",
            Self::StudioNotFound { .. } => "BIF-021",
            Self::InheritanceCycle { .. } => "BIF-022",
            Self::InvalidStudioMapping { .. } => "BIF-023",
            // Resolution errors
            Self::MissingVariable { .. } => "BIF-030",
            Self::InvalidVariableValue { .. } => "BIF-031",
            // Filesystem errors
            Self::FilesystemSync { .. } => "BIF-040",
            Self::ScanCancelled { .. } => "BIF-041",
            Self::ConfirmationMismatch { .. } => "BIF-042",
            // Graph errors
            Self::CyclicDependency { .. } => "BIF-050",
            Self::DepartmentNotFound { .. } => "BIF-051",
            Self::UnknownStatus { .. } => "BIF-052",
            Self::WorkflowNotFound { .. } => "BIF-053",
        }
    }

    /// Check if error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FilesystemSync { .. } | Self::ScanCancelled { .. }
        )
    }

    /// True for errors that must keep a configuration snapshot from activating
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. }
                | Self::YamlParse(_)
                | Self::UndeclaredVariable { .. }
                | Self::TemplateParse { .. }
                | Self::InvalidVariableDeclaration { .. }
                | Self::InheritanceCycle { .. }
                | Self::InvalidStudioMapping { .. }
                | Self::CyclicDependency { .. }
        )
    }
}

impl FixSuggestion for BifrostError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BifrostError::ConfigLoad { .. } => Some("Check the document path and its structure"),
            BifrostError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            BifrostError::IoError(_) => Some("Check file path and permissions"),
            BifrostError::ConfigError { .. } => {
                Some("Check ~/.config/bifrost/config.toml for syntax errors")
            }
            BifrostError::JsonError(_) => None,
            BifrostError::UndeclaredVariable { .. } => {
                Some("Declare the variable under 'variables:' in folder_mapping.yaml")
            }
            BifrostError::TemplateParse { .. } => {
                Some("Close every '{' and use uppercase names like {SHOT}")
            }
            BifrostError::InvalidVariableDeclaration { .. } => {
                Some("Enum variables need 'values:'; patterns must be valid regex")
            }
            BifrostError::PathTypeNotFound { .. } => {
                Some("Define the path type for the studio or give it a parent that does")
            }
            BifrostError::StudioNotFound { .. } => {
                Some("Add the studio under 'studio_mappings:' or fix the studio id")
            }
            BifrostError::InheritanceCycle { .. } => {
                Some("Studios cannot inherit from themselves, directly or indirectly")
            }
            BifrostError::InvalidStudioMapping { .. } => {
                Some("Check the studio's parent and required path types")
            }
            BifrostError::MissingVariable { .. } => {
                Some("Pass the variable in the context, e.g. --var SHOT=shot010")
            }
            BifrostError::InvalidVariableValue { .. } => {
                Some("Check the value against the variable's pattern or allowed values")
            }
            BifrostError::FilesystemSync { .. } => {
                Some("Check permissions and disk space, then retry")
            }
            BifrostError::ScanCancelled { .. } => {
                Some("Increase the scan timeout or scan a narrower path type")
            }
            BifrostError::ConfirmationMismatch { .. } => {
                Some("Re-run the drift scan and confirm the fresh report")
            }
            BifrostError::CyclicDependency { .. } => {
                Some("Remove circular requirements between departments")
            }
            BifrostError::DepartmentNotFound { .. } => {
                Some("Add the department to dependencies.yaml or fix the id")
            }
            BifrostError::UnknownStatus { .. } => {
                Some("Use one of the department's declared statuses")
            }
            BifrostError::WorkflowNotFound { .. } => {
                Some("Add the type under 'workflows:' or the project's *_workflows override")
            }
        }
    }
}
