//! Tabular file ingestion for bulk import.
//!
//! A file is read as a header row followed by data rows. Each data row becomes
//! a [`RawRow`]: a header-keyed map of untyped [`fleet_model::CellValue`]s plus
//! its line in the source. Any failure here is fatal for the whole file.

mod delimited;
mod error;
mod table;
mod workbook;

use std::path::{Path, PathBuf};

pub use delimited::read_delimited;
pub use error::{IngestError, Result};
pub use table::{RawRow, RawTable, normalize_header};
pub use workbook::read_workbook;

/// Maximum file size accepted for import (100 MB default).
pub const MAX_IMPORT_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
    Tsv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Sheet to read; the first sheet when `None`. Ignored for delimited files.
    pub sheet: Option<String>,
    pub max_file_size: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            max_file_size: MAX_IMPORT_FILE_SIZE,
        }
    }
}

impl IngestOptions {
    #[must_use]
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }
}

/// Check that `path` exists and is within `max_size`.
pub fn check_file_size(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    Ok(())
}

/// Parse `path` into raw rows, dispatching on its extension.
///
/// This is blocking; use [`read_raw_rows_async`] from async contexts.
pub fn read_raw_rows(path: &Path, options: &IngestOptions) -> Result<RawTable> {
    let format = SourceFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    check_file_size(path, options.max_file_size)?;

    let table = match format {
        SourceFormat::Workbook => read_workbook(path, options.sheet.as_deref())?,
        SourceFormat::Csv => read_delimited(path, b',')?,
        SourceFormat::Tsv => read_delimited(path, b'\t')?,
    };
    tracing::info!(
        path = %path.display(),
        sheet = table.sheet.as_deref().unwrap_or("-"),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "parsed import file"
    );
    Ok(table)
}

/// [`read_raw_rows`] on the blocking thread pool.
pub async fn read_raw_rows_async(path: PathBuf, options: IngestOptions) -> Result<RawTable> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || read_raw_rows(&task_path, &options))
        .await
        .map_err(|e| IngestError::Task {
            path,
            message: e.to_string(),
        })?
}
