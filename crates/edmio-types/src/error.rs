use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version string: {0}")]
    InvalidVersion(String),

    #[error("record for {type_name} expects {expected} fields, got {actual}")]
    FieldCount {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("field {field} of {type_name} is {expected}, got {actual}")]
    FieldKind {
        type_name: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
