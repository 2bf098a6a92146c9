use serde::{Deserialize, Serialize};

use fleet_model::{CellValue, ColumnDescriptor, Record};

/// Which values a search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Every primitive field of the record, shown or not.
    #[default]
    AllFields,
    /// Only the display values of currently visible columns.
    VisibleColumns,
}

/// Lower-cased needle; `None` when the term matches everything.
pub fn normalize_term(term: &str) -> Option<String> {
    if term.is_empty() {
        None
    } else {
        Some(term.to_lowercase())
    }
}

fn value_contains(value: &CellValue, needle: &str) -> bool {
    value
        .primitive_text()
        .is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Case-insensitive substring match over every string/number/boolean field.
pub fn record_matches<R: Record>(record: &R, needle: &str) -> bool {
    record
        .values()
        .iter()
        .any(|value| value_contains(value, needle))
}

/// Match against the display text of the given columns, rendered values included.
pub fn record_matches_columns<R: Record>(
    record: &R,
    columns: &[&ColumnDescriptor<R>],
    needle: &str,
) -> bool {
    columns.iter().any(|column| {
        column
            .cell(record)
            .display_text()
            .to_lowercase()
            .contains(needle)
    })
}

#[cfg(test)]
mod tests {
    use fleet_model::{DataRecord, RecordId};

    use super::*;

    fn vehicle() -> DataRecord {
        DataRecord::new(RecordId::new("v-1").unwrap())
            .with_field("plate", "AB-123")
            .with_field("seats", 5.0)
            .with_field("electric", true)
            .with_field("tags", CellValue::List(vec![CellValue::from("hidden-tag")]))
    }

    #[test]
    fn matches_any_primitive_field_case_insensitively() {
        let record = vehicle();
        assert!(record_matches(&record, "ab-1"));
        assert!(record_matches(&record, "5"));
        assert!(record_matches(&record, "tru"));
        assert!(record_matches(&record, "v-1"));
        assert!(!record_matches(&record, "hidden"));
    }

    #[test]
    fn empty_term_matches_everything() {
        assert_eq!(normalize_term(""), None);
        assert_eq!(normalize_term("AB").as_deref(), Some("ab"));
    }

    #[test]
    fn term_is_not_trimmed() {
        let record = vehicle();
        assert_eq!(normalize_term(" AB").as_deref(), Some(" ab"));
        assert!(!record_matches(&record, " ab-1"));
    }

    #[test]
    fn column_scope_uses_rendered_values() {
        let record = vehicle();
        let label = ColumnDescriptor::<DataRecord>::new("label", "Label")
            .with_render(|r| CellValue::Text(format!("Vehicle {}", r.value("plate"))));
        let seats = ColumnDescriptor::<DataRecord>::new("seats", "Seats");
        assert!(record_matches_columns(&record, &[&label], "vehicle ab"));
        assert!(!record_matches_columns(&record, &[&seats], "ab"));
    }
}
