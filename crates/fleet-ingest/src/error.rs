//! File-level ingestion errors.
//!
//! Every variant aborts the whole import before a single row is produced.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured size limit.
    #[error("file {path} is {size} bytes, larger than the {max_size} byte limit")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    // === Format Errors ===
    /// Extension is not a known spreadsheet or delimited format.
    #[error("unsupported file format for {path}: expected xlsx, xlsm, xlsb, xls, ods, csv or tsv")]
    UnsupportedFormat { path: PathBuf },

    /// The workbook could not be opened.
    #[error("failed to open workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// The workbook contains no sheets.
    #[error("workbook {path} contains no sheets")]
    NoSheets { path: PathBuf },

    /// A named sheet is missing from the workbook.
    #[error("sheet '{sheet}' not found in {path} (available: {})", available.join(", "))]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    /// Failed to parse a delimited file.
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The blocking parse task did not complete.
    #[error("parse task for {path} failed: {message}")]
    Task { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
