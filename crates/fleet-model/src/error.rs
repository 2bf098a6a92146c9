use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid record id: {0:?}")]
    InvalidRecordId(String),
    #[error("record has no usable `id` field")]
    MissingRecordId,
    #[error("record must be an object, got {0}")]
    NotAnObject(&'static str),
    #[error("invalid column key: {0:?}")]
    InvalidColumnKey(String),
    #[error("duplicate column key: {0}")]
    DuplicateColumnKey(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Failure reported by a host mutation callback (add/update/remove).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("{operation} is not supported for this resource")]
    Unsupported { operation: &'static str },
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
