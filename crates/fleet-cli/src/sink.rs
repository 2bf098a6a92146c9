//! JSON-lines record sink standing in for a persistence backend.
//!
//! Each accepted record is appended as one JSON object per line. Record ids
//! are derived from the source file and line, so importing the same file
//! twice rejects every row the second time.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sha2::{Digest, Sha256};

use fleet_model::{Mutations, MutationError, SubmitResponse};

use crate::logging::redact_value;

/// Stable id for the row on `line` of `source`: first 16 bytes of
/// `sha256(source \0 line)`, hex encoded.
pub fn record_id(source: &str, line: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(line.to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// A validated row on its way to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    pub id: String,
    pub line: usize,
    pub fields: Map<String, JsonValue>,
}

impl StagedRecord {
    pub fn new(source: &str, line: usize, fields: Map<String, JsonValue>) -> Self {
        Self {
            id: record_id(source, line),
            line,
            fields,
        }
    }

    fn to_json(&self) -> JsonValue {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("id".to_string(), JsonValue::String(self.id.clone()));
        object.extend(self.fields.clone());
        JsonValue::Object(object)
    }
}

pub struct JsonLinesSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

struct SinkState {
    ids: BTreeSet<String>,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, remembering the ids already in it.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let ids = existing_ids(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open sink {}", path.display()))?;
        tracing::debug!(path = %path.display(), existing = ids.len(), "opened record sink");
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(SinkState {
                ids,
                writer: BufWriter::new(file),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &StagedRecord) -> Result<SubmitResponse, MutationError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.ids.contains(&record.id) {
            return Ok(SubmitResponse::rejected(format!(
                "line {} was already imported",
                record.line
            )));
        }
        let line = serde_json::to_string(&record.to_json())
            .map_err(|e| MutationError::Rejected(e.to_string()))?;
        writeln!(state.writer, "{line}")
            .and_then(|()| state.writer.flush())
            .map_err(|e| MutationError::Unavailable(e.to_string()))?;
        state.ids.insert(record.id.clone());
        tracing::trace!(id = %record.id, record = redact_value(&line), "appended record");
        Ok(SubmitResponse::accepted("created").with_id(record.id.clone()))
    }
}

#[async_trait]
impl Mutations<StagedRecord> for JsonLinesSink {
    async fn add(&self, record: &StagedRecord) -> Result<SubmitResponse, MutationError> {
        self.append(record)
    }
}

fn existing_ids(path: &Path) -> Result<BTreeSet<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read sink {}", path.display()));
        }
    };
    let mut ids = BTreeSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("failed to read sink {}", path.display()))?;
        let Ok(value) = serde_json::from_str::<JsonValue>(&line) else {
            continue;
        };
        if let Some(id) = value.get("id").and_then(JsonValue::as_str) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

/// Read every object in a JSON-lines file, skipping blank lines.
pub fn read_json_lines(path: &Path) -> Result<Vec<JsonValue>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut values = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON", path.display(), index + 1))?;
        values.push(value);
    }
    Ok(values)
}
