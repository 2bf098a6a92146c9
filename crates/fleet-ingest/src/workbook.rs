//! Spreadsheet reading (xlsx, xlsm, xlsb, xls, ods) via calamine.

use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};

use fleet_model::CellValue;

use crate::error::{IngestError, Result};
use crate::table::{RawRow, RawTable, build_record, dedupe_headers, normalize_cell};

/// Read `sheet`, or the first sheet when `None`.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IngestError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(requested) => sheet_names
            .iter()
            .find(|name| name.as_str() == requested)
            .cloned()
            .ok_or_else(|| IngestError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: requested.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::NoSheets {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::Workbook {
            path: path.to_path_buf(),
            message: format!("failed to read sheet '{sheet_name}': {e}"),
        })?;

    // Data may not begin at A1.
    let (start_row, _) = range.start().unwrap_or((0, 0));
    let first_line = start_row as usize + 1;

    let mut headers: Option<Vec<Option<String>>> = None;
    let mut rows = Vec::new();
    for (index, row) in range.rows().enumerate() {
        let cells: Vec<CellValue> = row.iter().map(cell_value).collect();
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        let Some(columns) = &headers else {
            headers = Some(dedupe_headers(
                cells.iter().map(CellValue::display_text).collect(),
            ));
            continue;
        };
        rows.push(RawRow {
            line: first_line + index,
            cells: build_record(columns, cells),
        });
    }

    let headers = headers.unwrap_or_default().into_iter().flatten().collect();
    tracing::debug!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = rows.len(),
        "read worksheet"
    );
    Ok(RawTable {
        sheet: Some(sheet_name),
        headers,
        rows,
    })
}

/// Dates stay spreadsheet serial numbers; the schema layer turns them into
/// ISO dates when a field asks for one.
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            let text = normalize_cell(text);
            if text.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(text)
            }
        }
        Data::Float(number) => CellValue::Number(*number),
        Data::Int(number) => CellValue::from(*number),
        Data::Bool(flag) => CellValue::Bool(*flag),
        Data::DateTime(date) => CellValue::Number(date.as_f64()),
        Data::Error(error) => CellValue::Text(format!("#{error:?}")),
    }
}
