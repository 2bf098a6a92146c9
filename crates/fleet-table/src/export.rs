//! Export projection and writers.
//!
//! The projection carries the visible columns only, in visible order, one
//! row per filtered and sorted record. Cells keep their primitive kind so the
//! xlsx writer can emit numbers and booleans natively.

use std::io;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use fleet_model::CellValue;

use crate::error::{Result, TableError};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ExportTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, reducing non-primitive cells to their text.
    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        let row = cells.into_iter().map(export_cell).collect();
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let to_error = |source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let writer = csv::Writer::from_path(path).map_err(to_error)?;
        self.write_csv_records(writer).map_err(to_error)
    }

    pub fn write_csv_to<W: io::Write>(&self, writer: W) -> std::result::Result<(), csv::Error> {
        self.write_csv_records(csv::Writer::from_writer(writer))
    }

    fn write_csv_records<W: io::Write>(
        &self,
        mut writer: csv::Writer<W>,
    ) -> std::result::Result<(), csv::Error> {
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(CellValue::display_text))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write a single-sheet workbook: bold header row, then one row per record.
    pub fn write_xlsx(&self, path: &Path, sheet_name: &str) -> Result<()> {
        let to_error = |source| TableError::Xlsx {
            path: path.to_path_buf(),
            source,
        };
        let header_format = Format::new().set_bold();
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name).map_err(to_error)?;

        for (col, header) in self.headers.iter().enumerate() {
            let col = column_index(col, self.headers.len())?;
            worksheet
                .write_string_with_format(0, col, header, &header_format)
                .map_err(to_error)?;
        }

        for (index, row) in self.rows.iter().enumerate() {
            let row_num = u32::try_from(index + 1).map_err(|_| TableError::TooManyRows {
                count: self.rows.len(),
            })?;
            for (col, cell) in row.iter().enumerate() {
                let col = column_index(col, self.headers.len())?;
                match cell {
                    CellValue::Number(number) => {
                        worksheet.write_number(row_num, col, *number).map_err(to_error)?;
                    }
                    CellValue::Bool(flag) => {
                        worksheet.write_boolean(row_num, col, *flag).map_err(to_error)?;
                    }
                    CellValue::Text(text) if !text.is_empty() => {
                        worksheet.write_string(row_num, col, text).map_err(to_error)?;
                    }
                    _ => {}
                }
            }
        }

        workbook.save(path).map_err(to_error)?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "wrote xlsx export");
        Ok(())
    }
}

fn export_cell(cell: CellValue) -> CellValue {
    if cell.is_primitive() {
        cell
    } else {
        CellValue::Text(cell.display_text())
    }
}

fn column_index(col: usize, count: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| TableError::TooManyColumns { count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_primitive_cells_are_flattened() {
        let mut table = ExportTable::new(vec!["Name".into(), "Tags".into(), "Note".into()]);
        table.push_row(vec![
            CellValue::from("Van"),
            CellValue::List(vec![CellValue::from("a"), CellValue::from("b")]),
            CellValue::Null,
        ]);
        assert_eq!(
            table.rows[0],
            vec![
                CellValue::from("Van"),
                CellValue::from("ab"),
                CellValue::from(""),
            ]
        );
    }

    #[test]
    fn csv_uses_display_text() {
        let mut table = ExportTable::new(vec!["Plate".into(), "Seats".into(), "Electric".into()]);
        table.push_row(vec![
            CellValue::from("AB-1"),
            CellValue::Number(5.0),
            CellValue::Bool(false),
        ]);
        let mut out = Vec::new();
        table.write_csv_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Plate,Seats,Electric\nAB-1,5,false\n"
        );
    }
}
