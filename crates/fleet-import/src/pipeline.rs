//! Row-by-row validation of parsed import files.

use std::path::{Path, PathBuf};

use serde::Serialize;

use fleet_ingest::{IngestError, IngestOptions, RawRow, RawTable, read_raw_rows, read_raw_rows_async};
use fleet_model::{ImportRowOutcome, RawRecord};

use crate::mapping::{ColumnMapping, MappingCoverage};
use crate::schema::Schema;

/// Per-row outcomes in input order, plus counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport<T> {
    /// Exactly one per input row.
    pub outcomes: Vec<ImportRowOutcome<T>>,
    /// Rows read from the source, excluding the header and empty rows.
    pub total_rows: usize,
    /// Rows that mapped and passed the schema.
    pub valid_count: usize,
    /// `total_rows - valid_count`.
    pub invalid_count: usize,
    /// Present when validated from a file: how the mapping met its headers.
    pub coverage: Option<MappingCoverage>,
}

impl<T> ValidationReport<T> {
    pub fn from_outcomes(outcomes: Vec<ImportRowOutcome<T>>) -> Self {
        let valid_count = outcomes.iter().filter(|outcome| outcome.is_valid).count();
        Self {
            total_rows: outcomes.len(),
            valid_count,
            invalid_count: outcomes.len() - valid_count,
            outcomes,
            coverage: None,
        }
    }

    pub fn valid_rows(&self) -> impl Iterator<Item = &T> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.mapped_data.as_ref())
    }

    /// Source lines of the valid rows, aligned with [`Self::valid_rows`].
    pub fn valid_lines(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.mapped_data.is_some())
            .map(|outcome| outcome.line)
            .collect()
    }

    pub fn invalid_outcomes(&self) -> impl Iterator<Item = &ImportRowOutcome<T>> {
        self.outcomes.iter().filter(|outcome| !outcome.is_valid)
    }

    pub fn into_valid_rows(self) -> Vec<T> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| outcome.mapped_data)
            .collect()
    }
}

/// Maps raw rows to canonical fields and validates each one independently.
#[derive(Debug, Clone)]
pub struct ImportValidationPipeline<S> {
    mapping: ColumnMapping,
    schema: S,
}

impl<S> ImportValidationPipeline<S> {
    pub fn new(mapping: ColumnMapping, schema: S) -> Self {
        Self { mapping, schema }
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn validate_row<T>(&self, line: usize, raw: &RawRecord) -> ImportRowOutcome<T>
    where
        S: Schema<T>,
    {
        let mapped = self.mapping.apply(raw);
        match self.schema.validate(&mapped) {
            Ok(data) => ImportRowOutcome::valid(line, raw.clone(), data),
            Err(violations) => {
                let errors: Vec<String> = violations.iter().map(ToString::to_string).collect();
                tracing::debug!(line, errors = errors.len(), "row failed validation");
                ImportRowOutcome::invalid(line, raw.clone(), errors)
            }
        }
    }

    pub fn validate_rows<T>(&self, rows: &[RawRow]) -> ValidationReport<T>
    where
        S: Schema<T>,
    {
        let outcomes = rows
            .iter()
            .map(|row| self.validate_row(row.line, &row.cells))
            .collect();
        let report = ValidationReport::from_outcomes(outcomes);
        tracing::info!(
            total = report.total_rows,
            valid = report.valid_count,
            invalid = report.invalid_count,
            "validated import rows"
        );
        report
    }

    /// Validate bare records; line numbers assume a header on line 1.
    pub fn validate_records<T>(&self, records: &[RawRecord]) -> ValidationReport<T>
    where
        S: Schema<T>,
    {
        let rows: Vec<RawRow> = records
            .iter()
            .enumerate()
            .map(|(index, cells)| RawRow {
                line: index + 2,
                cells: cells.clone(),
            })
            .collect();
        self.validate_rows(&rows)
    }

    pub fn validate_table<T>(&self, table: &RawTable) -> ValidationReport<T>
    where
        S: Schema<T>,
    {
        let coverage = self.mapping.coverage(&table.headers);
        if !coverage.missing_headers.is_empty() {
            tracing::warn!(missing = ?coverage.missing_headers, "mapped headers absent from file");
        }
        let mut report = self.validate_rows(&table.rows);
        report.coverage = Some(coverage);
        report
    }

    /// Parse and validate a file. A file that cannot be parsed fails as a whole.
    pub fn validate_file<T>(
        &self,
        path: &Path,
        options: &IngestOptions,
    ) -> Result<ValidationReport<T>, IngestError>
    where
        S: Schema<T>,
    {
        let table = read_raw_rows(path, options)?;
        Ok(self.validate_table(&table))
    }

    /// Like [`Self::validate_file`], parsing on the blocking pool.
    pub async fn validate_file_async<T>(
        &self,
        path: PathBuf,
        options: IngestOptions,
    ) -> Result<ValidationReport<T>, IngestError>
    where
        S: Schema<T>,
    {
        let table = read_raw_rows_async(path, options).await?;
        Ok(self.validate_table(&table))
    }
}
