//! CSV / TSV reading.

use std::path::Path;

use csv::ReaderBuilder;

use fleet_model::CellValue;

use crate::error::{IngestError, Result};
use crate::table::{RawRow, RawTable, build_record, dedupe_headers, normalize_cell};

/// Read a delimited file. The first non-empty record is the header; every
/// cell is text, and blank cells are left out of the row.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<RawTable> {
    let to_error = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(to_error)?;

    let mut headers: Option<Vec<Option<String>>> = None;
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(to_error)?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let line = record
            .position()
            .and_then(|position| usize::try_from(position.line()).ok())
            .unwrap_or(index + 1);
        let Some(columns) = &headers else {
            headers = Some(dedupe_headers(record.iter().map(str::to_string).collect()));
            continue;
        };
        let cells = record.iter().map(|value| {
            let value = normalize_cell(value);
            if value.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(value)
            }
        });
        rows.push(RawRow {
            line,
            cells: build_record(columns, cells),
        });
    }

    let headers = headers.unwrap_or_default().into_iter().flatten().collect();
    tracing::debug!(path = %path.display(), rows = rows.len(), "read delimited file");
    Ok(RawTable {
        sheet: None,
        headers,
        rows,
    })
}
