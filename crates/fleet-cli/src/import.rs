//! `fleet import`: parse, validate, commit into the record sink.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use fleet_import::{
    CommitReport, CommitReviewRow, CommitStatus, ImportCommitExecutor, ProgressFn,
    ValidationReport, ValidationReviewRow, commit_review_columns, commit_review_rows,
    validation_review_columns, validation_review_rows,
};
use fleet_ingest::IngestOptions;
use fleet_layout::MemoryStore;
use fleet_table::{SortDirection, TableView, TableViewEngine};

use crate::profile::Profile;
use crate::sink::{JsonLinesSink, StagedRecord};

pub type ImportedFields = Map<String, JsonValue>;

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file: PathBuf,
    pub sheet: Option<String>,
    /// Validate only; nothing reaches the sink.
    pub dry_run: bool,
    /// Sink file; `<resource>.jsonl` in the working directory when unset.
    pub sink: Option<PathBuf>,
    pub commit_log: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub validation: ValidationReport<ImportedFields>,
    pub commit: Option<CommitReport<StagedRecord>>,
    pub sink: Option<PathBuf>,
}

impl ImportOutcome {
    /// A row failed to commit. Invalid rows are skipped, not failed.
    pub fn has_failures(&self) -> bool {
        self.commit.as_ref().is_some_and(|commit| commit.failed > 0)
    }

    /// Source lines of the committed rows, aligned with the commit outcomes.
    pub fn committed_lines(&self) -> Vec<usize> {
        self.commit
            .as_ref()
            .map(|commit| {
                commit
                    .outcomes
                    .iter()
                    .map(|outcome| outcome.original_data.line)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct CommitLogEntry<'a> {
    at: String,
    file: &'a Path,
    resource: &'a str,
    rows: usize,
    invalid: usize,
    succeeded: usize,
    failed: usize,
    status: CommitStatus,
    cancelled: bool,
}

pub async fn run_import(
    profile: &Profile,
    request: &ImportRequest,
    progress: Option<ProgressFn>,
) -> Result<ImportOutcome> {
    let pipeline = profile.pipeline()?;
    let sheet = request.sheet.clone().or_else(|| profile.sheet.clone());
    let options = IngestOptions::default().with_sheet(sheet);
    let validation: ValidationReport<ImportedFields> = pipeline
        .validate_file_async(request.file.clone(), options)
        .await
        .with_context(|| format!("cannot import {}", request.file.display()))?;

    if request.dry_run || validation.valid_count == 0 {
        tracing::info!(
            dry_run = request.dry_run,
            valid = validation.valid_count,
            "nothing committed"
        );
        return Ok(ImportOutcome {
            validation,
            commit: None,
            sink: None,
        });
    }

    let source = fs::canonicalize(&request.file).unwrap_or_else(|_| request.file.clone());
    let source = source.display().to_string();
    let staged: Vec<StagedRecord> = validation
        .valid_lines()
        .into_iter()
        .zip(validation.valid_rows())
        .map(|(line, fields)| StagedRecord::new(&source, line, fields.clone()))
        .collect();

    let sink_path = request
        .sink
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.jsonl", profile.resource)));
    let sink = JsonLinesSink::open(&sink_path)?;
    let commit = ImportCommitExecutor::new(&sink)
        .with_progress(progress)
        .commit(staged)
        .await;

    if let Some(log_path) = &request.commit_log {
        let entry = CommitLogEntry {
            at: chrono::Utc::now().to_rfc3339(),
            file: &request.file,
            resource: &profile.resource,
            rows: validation.total_rows,
            invalid: validation.invalid_count,
            succeeded: commit.succeeded,
            failed: commit.failed,
            status: commit.status(),
            cancelled: commit.cancelled,
        };
        if let Err(e) = append_commit_log(log_path, &entry) {
            tracing::warn!(path = %log_path.display(), "failed to append commit log: {e:#}");
        }
    }

    Ok(ImportOutcome {
        validation,
        commit: Some(commit),
        sink: Some(sink.path().to_path_buf()),
    })
}

fn append_commit_log(path: &Path, entry: &CommitLogEntry<'_>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let line = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// First page of the invalid rows, ordered by source line.
pub fn invalid_rows_view(
    report: &ValidationReport<ImportedFields>,
    items_per_page: usize,
) -> Result<Option<TableView>> {
    if report.invalid_count == 0 {
        return Ok(None);
    }
    let mut engine = TableViewEngine::new(
        validation_review_columns(&[])?,
        Arc::new(MemoryStore::new()),
        "import_review",
    )
    .with_records(validation_review_rows(report))
    .with_items_per_page(items_per_page)
    .with_default_sort("line", SortDirection::Ascending);
    engine.set_custom_filter(Some(Arc::new(|row: &ValidationReviewRow| !row.is_valid)));
    Ok(Some(engine.view()))
}

/// First page of the rows the sink did not accept.
pub fn failed_rows_view(outcome: &ImportOutcome, items_per_page: usize) -> Result<Option<TableView>> {
    let Some(commit) = outcome.commit.as_ref().filter(|commit| commit.failed > 0) else {
        return Ok(None);
    };
    let mut engine = TableViewEngine::new(
        commit_review_columns()?,
        Arc::new(MemoryStore::new()),
        "commit_review",
    )
    .with_records(commit_review_rows(&outcome.committed_lines(), commit))
    .with_items_per_page(items_per_page);
    engine.set_custom_filter(Some(Arc::new(|row: &CommitReviewRow| !row.success)));
    tracing::debug!(failed = engine.filtered_count(), "rendering failed rows");
    Ok(Some(engine.view()))
}

