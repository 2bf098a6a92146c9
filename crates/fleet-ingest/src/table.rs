use serde::Serialize;

use fleet_model::{CellValue, RawRecord};

/// One data row with its 1-based line in the source (the header is line 1
/// unless the sheet starts lower down).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRow {
    pub line: usize,
    pub cells: RawRecord,
}

/// A parsed sheet: header row plus data rows keyed by header.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawTable {
    /// Sheet the rows came from; `None` for delimited files.
    pub sheet: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &RawRecord> {
        self.rows.iter().map(|row| &row.cells)
    }
}

/// Trim and collapse inner whitespace; strips a stray BOM.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Header names in column order. Blank headers become `None` and their
/// column is ignored; repeated names get `_1`, `_2`, ... suffixes.
pub(crate) fn dedupe_headers(raw: Vec<String>) -> Vec<Option<String>> {
    let mut seen: Vec<String> = Vec::new();
    raw.into_iter()
        .map(|header| {
            let header = normalize_header(&header);
            if header.is_empty() {
                return None;
            }
            let mut candidate = header.clone();
            let mut suffix = 1;
            while seen.contains(&candidate) {
                candidate = format!("{header}_{suffix}");
                suffix += 1;
            }
            seen.push(candidate.clone());
            Some(candidate)
        })
        .collect()
}

/// Pair a row's cells with headers, dropping null cells and unnamed columns.
pub(crate) fn build_record(
    headers: &[Option<String>],
    cells: impl IntoIterator<Item = CellValue>,
) -> RawRecord {
    headers
        .iter()
        .zip(cells)
        .filter_map(|(header, cell)| match (header, cell) {
            (Some(_), CellValue::Null) | (None, _) => None,
            (Some(header), cell) => Some((header.clone(), cell)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_normalized_and_deduplicated() {
        let headers = dedupe_headers(vec![
            "\u{feff} Plate ".to_string(),
            "First   Name".to_string(),
            String::new(),
            "Plate".to_string(),
            "Plate".to_string(),
        ]);
        assert_eq!(
            headers,
            vec![
                Some("Plate".to_string()),
                Some("First Name".to_string()),
                None,
                Some("Plate_1".to_string()),
                Some("Plate_2".to_string()),
            ]
        );
    }

    #[test]
    fn null_cells_and_unnamed_columns_are_dropped() {
        let headers = vec![Some("A".to_string()), None, Some("C".to_string())];
        let record = build_record(
            &headers,
            vec![CellValue::Null, CellValue::from("x"), CellValue::Number(1.0)],
        );
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("C"), Some(&CellValue::Number(1.0)));
    }
}
