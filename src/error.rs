//! Error types for plsql2pg

use thiserror::Error;

/// Errors raised by the transformation engine.
///
/// Every component raises a distinct named error instead of a sentinel so the
/// orchestration layer can choose between skip-and-continue and whole-container
/// abort. Circular type dependencies are reported as data, not as errors.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("structural scan failed in container {container} at offset {position}: {message}")]
    StructuralScan {
        container: String,
        position: usize,
        message: String,
    },

    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{count} syntax error(s) in fragment: {detail}")]
    SyntaxErrors { count: usize, detail: String },
}

impl TransformError {
    /// Shorthand for an unsupported-construct failure naming the production.
    pub fn unsupported(construct: impl Into<String>) -> Self {
        TransformError::UnsupportedConstruct {
            construct: construct.into(),
        }
    }

    /// Shorthand for an invalid-input contract violation.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        TransformError::InvalidInput {
            message: message.into(),
        }
    }
}
