//! Errors raised at the command and scene boundary

use dsvis_models_core::{ModelError, StructureKind};

use crate::command::CommandType;

/// A command that cannot be routed or whose payload fails validation.
/// Raised before any model is touched.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CommandError {
    /// Payload is not a JSON object
    #[error("Command payload must be a mapping")]
    PayloadNotMapping,

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Field present with a type the schema does not allow
    #[error("Field '{field}' must be {expected}")]
    WrongType { field: String, expected: String },

    #[error("Unexpected payload fields: {}", .fields.join(", "))]
    UnexpectedFields { fields: Vec<String> },

    /// A cross-field rule failed
    #[error("{message}")]
    Rule { message: String },

    /// Create-like command on an unknown structure without `payload.kind`
    #[error("{command} requires payload.kind")]
    MissingKind { command: CommandType },

    #[error("Unsupported command/kind combination: unknown kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("Unsupported command/kind combination: {command} for {kind}")]
    UnsupportedCombination { command: CommandType, kind: StructureKind },

    #[error("Structure not found: '{structure_id}'")]
    StructureNotFound { structure_id: String },

    #[error("Kind mismatch for '{structure_id}': expected {expected}, found {found}")]
    KindMismatch {
        structure_id: String,
        expected: StructureKind,
        found: StructureKind,
    },

    /// Linear index outside the structure's bounds
    #[error("{command} index {index} out of range (len {len})")]
    IndexOutOfRange {
        command: CommandType,
        index: i64,
        len: usize,
    },

    #[error("Invalid scene data: {reason}")]
    InvalidSnapshot { reason: String },

    /// A snapshot structure could not be replayed
    #[error("Failed to restore state for {structure_id} ({kind}): {reason}")]
    RestoreFailed {
        structure_id: String,
        kind: String,
        reason: String,
    },

    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },
}

impl CommandError {
    pub fn snapshot(reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot { reason: reason.into() }
    }

    pub fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Short category name used in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            Self::PayloadNotMapping
            | Self::MissingField { .. }
            | Self::WrongType { .. }
            | Self::UnexpectedFields { .. }
            | Self::Rule { .. } => "payload",
            Self::MissingKind { .. } | Self::UnknownKind { .. } | Self::UnsupportedCombination { .. } => "routing",
            Self::StructureNotFound { .. } | Self::KindMismatch { .. } | Self::IndexOutOfRange { .. } => "target",
            Self::InvalidSnapshot { .. } | Self::RestoreFailed { .. } => "snapshot",
            Self::Json(_) | Self::Io { .. } => "io",
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Error returned by [`crate::SceneGraph`] entry points.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SceneError {
    pub fn as_command(&self) -> Option<&CommandError> {
        match self {
            Self::Command(err) => Some(err),
            Self::Model(_) => None,
        }
    }
}
