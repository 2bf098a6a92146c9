use std::io::Write;

use fleet_import::{
    ColumnMapping, FieldKind, FieldSpec, FieldViolation, ImportValidationPipeline, MappedRecord,
    RowSchema, ValidationReport,
};
use fleet_ingest::{IngestError, IngestOptions};
use fleet_model::{CellValue, RawRecord};
use proptest::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Person {
    name: String,
    age: f64,
}

fn person_pipeline() -> ImportValidationPipeline<RowSchema> {
    let mapping = ColumnMapping::from_pairs([("Name", "name"), ("Age", "age")]).unwrap();
    let schema = RowSchema::new(vec![
        FieldSpec::new("name", FieldKind::Text).required(),
        FieldSpec::new("age", FieldKind::Number).required().min(0.0),
    ])
    .unwrap();
    ImportValidationPipeline::new(mapping, schema)
}

fn raw(pairs: &[(&str, &str)]) -> RawRecord {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), CellValue::from(*value)))
        .collect()
}

#[test]
fn non_numeric_age_is_a_row_error() {
    let report: ValidationReport<Person> = person_pipeline().validate_records(&[
        raw(&[("Name", "X"), ("Age", "abc")]),
        raw(&[("Name", "Y"), ("Age", "5")]),
    ]);

    assert_eq!(report.total_rows, 2);
    assert_eq!(report.valid_count, 1);
    assert_eq!(report.invalid_count, 1);

    let first = &report.outcomes[0];
    assert!(!first.is_valid);
    assert!(first.mapped_data.is_none());
    assert_eq!(first.errors, vec!["age: expected number".to_string()]);
    assert_eq!(first.original_row, raw(&[("Name", "X"), ("Age", "abc")]));

    let second = &report.outcomes[1];
    assert!(second.is_valid);
    assert!(second.errors.is_empty());
    assert_eq!(
        second.mapped_data,
        Some(Person {
            name: "Y".to_string(),
            age: 5.0
        })
    );
    assert_eq!(report.valid_lines(), vec![3]);
}

#[test]
fn every_violation_is_reported() {
    let report: ValidationReport<Person> =
        person_pipeline().validate_records(&[raw(&[("Age", "-4")])]);
    assert_eq!(
        report.outcomes[0].error_text(),
        "name: required; age: must be at least 0"
    );
}

#[test]
fn closure_schemas_plug_in() {
    let schema = |data: &MappedRecord| match data.get("plate") {
        Some(CellValue::Text(plate)) if plate.len() > 2 => Ok(plate.to_uppercase()),
        _ => Err(vec![FieldViolation::new("plate", "too short")]),
    };
    let pipeline =
        ImportValidationPipeline::new(ColumnMapping::from_pairs([("Plate", "plate")]).unwrap(), schema);
    let report: ValidationReport<String> =
        pipeline.validate_records(&[raw(&[("Plate", "ab-12")]), raw(&[("Plate", "x")])]);
    assert_eq!(report.into_valid_rows(), vec!["AB-12".to_string()]);
}

#[test]
fn validates_csv_with_source_lines_and_coverage() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Name,Age,Colour").unwrap();
    writeln!(file, "Ann,41,red").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "Bob,old,blue").unwrap();
    file.flush().unwrap();

    let report: ValidationReport<Person> = person_pipeline()
        .validate_file(file.path(), &IngestOptions::default())
        .unwrap();
    assert_eq!(report.total_rows, 2);
    assert_eq!(report.outcomes[0].line, 2);
    assert_eq!(report.outcomes[1].line, 4);
    assert!(!report.outcomes[1].is_valid);

    let coverage = report.coverage.unwrap();
    assert!(coverage.missing_headers.is_empty());
    assert_eq!(coverage.unmapped_headers, vec!["Colour".to_string()]);
}

#[test]
fn unreadable_file_fails_whole_validation() {
    let result: Result<ValidationReport<Person>, IngestError> = person_pipeline()
        .validate_file(std::path::Path::new("/nonexistent/people.csv"), &IngestOptions::default());
    assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
}

#[tokio::test]
async fn validates_file_on_blocking_pool() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Name,Age\nCid,7").unwrap();
    file.flush().unwrap();

    let report: ValidationReport<Person> = person_pipeline()
        .validate_file_async(file.path().to_path_buf(), IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(report.valid_count, 1);
}

fn arbitrary_row() -> impl Strategy<Value = RawRecord> {
    (
        proptest::option::of("[A-Za-z ]{0,8}"),
        proptest::option::of(prop_oneof!["[0-9]{1,3}", "[a-z]{1,4}", Just(String::new())]),
    )
        .prop_map(|(name, age)| {
            let mut row = RawRecord::new();
            if let Some(name) = name {
                row.insert("Name".to_string(), CellValue::Text(name));
            }
            if let Some(age) = age {
                row.insert("Age".to_string(), CellValue::Text(age));
            }
            row
        })
}

proptest! {
    #[test]
    fn one_outcome_per_raw_row(rows in proptest::collection::vec(arbitrary_row(), 0..40)) {
        let report: ValidationReport<Person> = person_pipeline().validate_records(&rows);
        prop_assert_eq!(report.outcomes.len(), rows.len());
        prop_assert_eq!(report.valid_count + report.invalid_count, rows.len());
        for (outcome, row) in report.outcomes.iter().zip(&rows) {
            prop_assert_eq!(&outcome.original_row, row);
            prop_assert_eq!(outcome.is_valid, outcome.mapped_data.is_some());
            prop_assert_eq!(outcome.is_valid, outcome.errors.is_empty());
        }
    }
}
