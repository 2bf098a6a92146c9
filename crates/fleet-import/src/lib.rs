//! Bulk import for fleet admin resources.
//!
//! The flow is parse (via `fleet-ingest`), map headers to canonical fields,
//! validate each row against a [`Schema`], then commit the valid rows one at
//! a time through a host [`fleet_model::Mutations`] implementation.
//!
//! Validation never short-circuits: every parsed row yields exactly one
//! [`fleet_model::ImportRowOutcome`], and every committed row yields exactly
//! one [`fleet_model::CommitOutcome`], in input order.
//!
//! [`ImportSession`] strings the stages together as a small state machine.

pub mod commit;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod review;
pub mod schema;
pub mod session;

pub use commit::{
    CANCELLED_ERROR, CommitOptions, CommitReport, CommitStatus, ImportCommitExecutor, ProgressFn,
};
pub use error::{MappingError, SchemaError, SessionError};
pub use mapping::{ColumnMapping, MappedRecord, MappingCoverage};
pub use pipeline::{ImportValidationPipeline, ValidationReport};
pub use review::{
    CommitReviewRow, ValidationReviewRow, commit_review_columns, commit_review_rows,
    validation_review_columns, validation_review_rows,
};
pub use schema::{FieldKind, FieldSpec, FieldViolation, RowSchema, Schema};
pub use session::{ImportSession, SessionPhase, SessionState};
