//! Error handling for qmgr operations.

use thiserror::Error;

use crate::diff::ValueShape;
use crate::kind::ObjectKind;

/// Result type for qmgr operations.
pub type QmgrResult<T> = Result<T, QmgrError>;

/// Errors that can occur while mapping, diffing or executing qmgr commands.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum QmgrError {
    /// A listed attribute could not be converted into its typed field.
    #[error("Invalid value for {kind} attribute '{attribute}': {message}")]
    InvalidAttribute {
        kind: ObjectKind,
        attribute: String,
        message: String,
    },

    /// Old and new values handed to the differ have different shapes.
    #[error("Shape mismatch for attribute '{attribute}': {old:?} vs {new:?}")]
    ShapeMismatch {
        attribute: String,
        old: ValueShape,
        new: ValueShape,
    },

    /// A value contains both quote characters and cannot be embedded safely.
    #[error("Value for attribute '{attribute}' contains both quote characters: {value}")]
    QuoteCollision { attribute: String, value: String },

    /// A command in a batch exited unsuccessfully.
    #[error("qmgr command #{index} failed: {command} - {stderr}")]
    CommandFailed {
        index: usize,
        command: String,
        stderr: String,
    },

    /// A command in a batch did not finish in time.
    #[error("qmgr command #{index} timed out after {seconds}s: {command} - {stderr}")]
    Timeout {
        index: usize,
        command: String,
        stderr: String,
        seconds: u64,
    },

    /// The object to update does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: ObjectKind, name: String },

    /// The object was not visible when re-read after creation.
    #[error("{kind} '{name}' was not found after create")]
    MissingAfterCreate { kind: ObjectKind, name: String },

    /// The operation does not exist for this object kind.
    #[error("Unsupported operation for {kind}: {operation}")]
    Unsupported {
        kind: ObjectKind,
        operation: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl QmgrError {
    /// Build an [`QmgrError::InvalidAttribute`] for a kind/attribute pair.
    pub fn invalid_attribute(
        kind: ObjectKind,
        attribute: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        QmgrError::InvalidAttribute {
            kind,
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}
