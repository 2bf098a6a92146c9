//! Error types for the import crate.
//!
//! Row-level problems are never errors here: they are recorded in
//! `ImportRowOutcome::errors` and `CommitOutcome::error`.

use thiserror::Error;

use fleet_ingest::IngestError;

use crate::session::SessionPhase;

/// Errors from building a header mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("mapping header must not be empty")]
    EmptyHeader,

    #[error("header '{header}' maps to an empty field name")]
    EmptyField { header: String },

    /// Two headers would feed the same canonical field.
    #[error("field '{field}' is already mapped from header '{header}'")]
    FieldAlreadyMapped { field: String, header: String },
}

/// Errors from building a row schema (not from validating rows).
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema field key must not be empty")]
    EmptyFieldKey,

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("field '{field}' has an invalid pattern: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("field '{field}' has min greater than max")]
    InvalidBounds { field: String },
}

/// Errors from driving an import session out of order, or from the file itself.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while the import session is {phase}")]
    InvalidTransition {
        phase: SessionPhase,
        action: &'static str,
    },

    #[error("no valid rows to commit")]
    NothingToCommit,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}
