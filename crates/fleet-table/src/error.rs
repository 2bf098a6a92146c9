use std::path::PathBuf;

use thiserror::Error;

use fleet_model::{Action, MutationError};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("nothing to export: no rows match the current filter")]
    NothingToExport,

    #[error("not permitted to {action} {resource}")]
    Forbidden { resource: String, action: Action },

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("export has {count} columns, more than a worksheet can hold")]
    TooManyColumns { count: usize },

    #[error("export has {count} rows, more than a worksheet can hold")]
    TooManyRows { count: usize },

    #[error("failed to write csv export {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write xlsx export {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

pub type Result<T> = std::result::Result<T, TableError>;
