//! Error taxonomy for table operations
//!
//! Every operation either fully succeeds and returns a new consistent
//! [`Table`](crate::Table), or fails with one of these errors and leaves
//! all existing table handles unchanged.

use thiserror::Error;

/// Errors surfaced by table construction, transformation, and ingestion.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced column does not exist.
    #[error("unknown column: '{name}'")]
    UnknownColumn { name: String },

    /// Rows or columns are inconsistent with the (declared or inferred) schema.
    #[error("schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    /// Row counts do not line up when combining columns.
    #[error("shape mismatch: expected {expected} rows, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// A strict aggregator found no usable values and has no identity.
    #[error("empty aggregation: {op} over column '{column}' has no values")]
    EmptyAggregation { column: String, op: String },

    /// An expression or aggregator was applied to an incompatible type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// I/O failure while reading or writing external data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited-text input.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON input.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unknown_column(name: impl Into<String>) -> Self {
        Error::UnknownColumn { name: name.into() }
    }

    pub(crate) fn schema_mismatch(reason: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
