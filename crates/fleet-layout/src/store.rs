//! Key-value persistence substrate for layout state.
//!
//! Writes are fire-and-forget and last-write-wins: a failed write is logged
//! and otherwise ignored, a failed or malformed read behaves like a missing key.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value as JsonValue;

use crate::error::LayoutError;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<JsonValue>;
    fn set(&self, key: &str, value: JsonValue);
}

/// In-process store, mainly for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, JsonValue> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<JsonValue> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: JsonValue) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }

    pub fn try_get(&self, key: &str) -> Result<Option<JsonValue>, LayoutError> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LayoutError::Io {
                    operation: "read",
                    path,
                    source,
                });
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| LayoutError::Parse { path, source })
    }

    /// Temp file + rename so a crash never leaves a half-written layout.
    pub fn try_set(&self, key: &str, value: &JsonValue) -> Result<(), LayoutError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|source| LayoutError::Io {
            operation: "create directory",
            path: self.dir.clone(),
            source,
        })?;

        let bytes = serde_json::to_vec_pretty(value).map_err(|source| LayoutError::Parse {
            path: path.clone(),
            source,
        })?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(|source| LayoutError::Io {
            operation: "create",
            path: temp_path.clone(),
            source,
        })?;
        file.write_all(&bytes).map_err(|source| LayoutError::Io {
            operation: "write",
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| LayoutError::Io {
            operation: "rename",
            path: path.clone(),
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<JsonValue> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring stored layout entry {key}: {e}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: JsonValue) {
        if let Err(e) = self.try_set(key, &value) {
            tracing::warn!("Failed to persist layout entry {key}: {e}");
        }
    }
}
