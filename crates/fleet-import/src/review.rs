//! Validation and commit outcomes as table rows.
//!
//! Both review row types implement [`Record`], so a host can page, sort and
//! search them through the same table engine it uses for live data.

use fleet_model::{CellValue, ColumnDescriptor, ColumnSet, ModelError, RawRecord, Record};

use crate::commit::CommitReport;
use crate::pipeline::ValidationReport;

/// Prefix for keys that read a cell of the original spreadsheet row.
pub const SOURCE_PREFIX: &str = "source.";

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReviewRow {
    id: String,
    pub line: usize,
    pub is_valid: bool,
    pub errors: String,
    pub source: RawRecord,
}

impl ValidationReviewRow {
    pub fn status(&self) -> &'static str {
        if self.is_valid { "valid" } else { "invalid" }
    }
}

impl Record for ValidationReviewRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Text(self.id.clone()),
            "line" => line_value(self.line),
            "status" => CellValue::from(self.status()),
            "errors" if self.errors.is_empty() => CellValue::Null,
            "errors" => CellValue::Text(self.errors.clone()),
            _ => key
                .strip_prefix(SOURCE_PREFIX)
                .and_then(|header| self.source.get(header))
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn values(&self) -> Vec<CellValue> {
        let mut values = vec![
            line_value(self.line),
            CellValue::from(self.status()),
            CellValue::Text(self.errors.clone()),
        ];
        values.extend(self.source.values().cloned());
        values
    }
}

pub fn validation_review_rows<T>(report: &ValidationReport<T>) -> Vec<ValidationReviewRow> {
    report
        .outcomes
        .iter()
        .map(|outcome| ValidationReviewRow {
            id: format!("line-{}", outcome.line),
            line: outcome.line,
            is_valid: outcome.is_valid,
            errors: outcome.error_text(),
            source: outcome.original_row.clone(),
        })
        .collect()
}

/// `line`, `status`, `errors`, then one hidden-by-default column per source header.
pub fn validation_review_columns(
    headers: &[String],
) -> Result<ColumnSet<ValidationReviewRow>, ModelError> {
    let mut columns = vec![
        ColumnDescriptor::new("line", "Line"),
        ColumnDescriptor::new("status", "Status"),
        ColumnDescriptor::new("errors", "Errors").sortable(false),
    ];
    columns.extend(headers.iter().map(|header| {
        ColumnDescriptor::new(format!("{SOURCE_PREFIX}{header}"), header.clone())
            .visible_by_default(false)
    }));
    ColumnSet::new(columns)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitReviewRow {
    id: String,
    pub line: usize,
    pub success: bool,
    pub message: Option<String>,
}

impl CommitReviewRow {
    pub fn status(&self) -> &'static str {
        if self.success { "succeeded" } else { "failed" }
    }
}

impl Record for CommitReviewRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Text(self.id.clone()),
            "line" => line_value(self.line),
            "status" => CellValue::from(self.status()),
            "message" => self.message.clone().map(CellValue::Text).unwrap_or_default(),
            _ => CellValue::Null,
        }
    }

    fn values(&self) -> Vec<CellValue> {
        vec![
            line_value(self.line),
            CellValue::from(self.status()),
            self.value("message"),
        ]
    }
}

/// Pair commit outcomes with the source lines they came from.
///
/// `lines` is [`ValidationReport::valid_lines`] of the report whose valid
/// rows were committed; outcomes past the end of `lines` get line 0.
pub fn commit_review_rows<T>(lines: &[usize], report: &CommitReport<T>) -> Vec<CommitReviewRow> {
    report
        .outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| {
            let line = lines.get(index).copied().unwrap_or_default();
            CommitReviewRow {
                id: format!("commit-{}", index + 1),
                line,
                success: outcome.success,
                message: if outcome.success {
                    outcome.message.clone()
                } else {
                    outcome.error.clone()
                },
            }
        })
        .collect()
}

pub fn commit_review_columns() -> Result<ColumnSet<CommitReviewRow>, ModelError> {
    ColumnSet::new(vec![
        ColumnDescriptor::new("line", "Line"),
        ColumnDescriptor::new("status", "Status"),
        ColumnDescriptor::new("message", "Message").sortable(false),
    ])
}

#[allow(clippy::cast_precision_loss)]
fn line_value(line: usize) -> CellValue {
    CellValue::Number(line as f64)
}

#[cfg(test)]
mod tests {
    use fleet_model::{CommitOutcome, ImportRowOutcome, SubmitResponse};

    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), CellValue::from(*value)))
            .collect()
    }

    #[test]
    fn validation_rows_expose_source_cells() {
        let report = ValidationReport::from_outcomes(vec![
            ImportRowOutcome::valid(2, raw(&[("Plate", "AB-1")]), ()),
            ImportRowOutcome::invalid(
                3,
                raw(&[("Plate", "")]),
                vec!["plate: required".to_string(), "seats: expected number".to_string()],
            ),
        ]);
        let rows = validation_review_rows(&report);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value("status"), CellValue::from("valid"));
        assert_eq!(rows[0].value("errors"), CellValue::Null);
        assert_eq!(rows[0].value("source.Plate"), CellValue::from("AB-1"));
        assert_eq!(rows[1].value("line"), CellValue::Number(3.0));
        assert_eq!(
            rows[1].value("errors"),
            CellValue::from("plate: required; seats: expected number")
        );
        assert_eq!(rows[1].value("source.Missing"), CellValue::Null);
    }

    #[test]
    fn source_columns_are_hidden_by_default() {
        let columns = validation_review_columns(&["Plate".to_string()]).unwrap();
        assert_eq!(columns.keys(), vec!["line", "status", "errors", "source.Plate"]);
        assert!(!columns.get("source.Plate").unwrap().default_visible);
    }

    #[test]
    fn commit_rows_follow_valid_lines() {
        let report = CommitReport::from_outcomes(
            vec![
                CommitOutcome::from_response(
                    (),
                    SubmitResponse::accepted("created"),
                ),
                CommitOutcome::failed((), "duplicate plate"),
            ],
            false,
        );
        let rows = commit_review_rows(&[2, 5], &report);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].value("message"), CellValue::from("created"));
        assert_eq!(rows[1].line, 5);
        assert_eq!(rows[1].status(), "failed");
        assert_eq!(rows[1].value("message"), CellValue::from("duplicate plate"));
    }
}
