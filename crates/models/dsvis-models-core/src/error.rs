//! Error type for model operations

/// Raised when a payload is semantically unsatisfiable for a model's current
/// state. Normal "not found"/"empty" outcomes are timeline messages instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ModelError {
    /// A required argument was absent or null
    #[error("{op} requires {argument}")]
    MissingArgument { op: String, argument: String },

    /// An argument was present but unusable
    #[error("Invalid {argument} for {op}: {reason}")]
    InvalidArgument {
        op: String,
        argument: String,
        reason: String,
    },

    /// Linear index outside the valid range
    #[error("{op} index {index} out of range (len {len})")]
    IndexOutOfRange { op: String, index: i64, len: usize },

    /// Operation not supported by this kind
    #[error("Unsupported operation: {op} for {kind}")]
    UnsupportedOperation { kind: String, op: String },

    /// Keys that cannot be ordered against each other
    #[error("Cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },

    /// The model is not in a state that permits the operation
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
}

impl ModelError {
    pub fn missing(op: &str, argument: &str) -> Self {
        Self::MissingArgument {
            op: op.to_string(),
            argument: argument.to_string(),
        }
    }

    pub fn invalid(op: &str, argument: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            op: op.to_string(),
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }

    pub fn out_of_range(op: &str, index: i64, len: usize) -> Self {
        Self::IndexOutOfRange {
            op: op.to_string(),
            index,
            len,
        }
    }

    pub fn state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Short category name used in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingArgument { .. } | Self::InvalidArgument { .. } => "argument",
            Self::IndexOutOfRange { .. } => "range",
            Self::UnsupportedOperation { .. } => "unsupported",
            Self::Incomparable { .. } => "ordering",
            Self::InvalidState { .. } => "state",
        }
    }
}
