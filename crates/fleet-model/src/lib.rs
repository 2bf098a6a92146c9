pub mod capability;
pub mod column;
pub mod error;
pub mod ids;
pub mod mutation;
pub mod outcome;
pub mod record;
pub mod value;

pub use capability::{Action, AllowAll, CapabilityOracle};
pub use column::{ColumnDescriptor, ColumnSet, ColumnSpec, DeclaredColumn, RenderFn};
pub use error::{ModelError, MutationError, Result};
pub use ids::RecordId;
pub use mutation::Mutations;
pub use outcome::{CommitOutcome, ImportRowOutcome, RawRecord, SubmitResponse};
pub use record::{DataRecord, Record};
pub use value::CellValue;
