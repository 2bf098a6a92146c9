//! Spreadsheet header to canonical field mapping.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use fleet_model::RawRecord;

use crate::error::MappingError;

/// Canonical field name to cell value, before schema validation.
pub type MappedRecord = RawRecord;

/// External header name to canonical field key.
///
/// Each canonical field is fed by at most one header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ColumnMapping {
    entries: BTreeMap<String, String>,
}

/// How a mapping lines up with the headers actually present in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingCoverage {
    /// `(header, field)` pairs whose header is present.
    pub mapped: Vec<(String, String)>,
    /// Mapped headers the file does not have.
    pub missing_headers: Vec<String>,
    /// File headers no mapping entry reads.
    pub unmapped_headers: Vec<String>,
}

impl MappingCoverage {
    pub fn is_complete(&self) -> bool {
        self.missing_headers.is_empty()
    }
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, H, F>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (H, F)>,
        H: Into<String>,
        F: Into<String>,
    {
        let mut mapping = Self::new();
        for (header, field) in pairs {
            mapping.insert(header, field)?;
        }
        Ok(mapping)
    }

    /// Map `header` to `field`, replacing any previous target of `header`.
    pub fn insert(
        &mut self,
        header: impl Into<String>,
        field: impl Into<String>,
    ) -> Result<(), MappingError> {
        let header = header.into();
        let field = field.into();
        if header.trim().is_empty() {
            return Err(MappingError::EmptyHeader);
        }
        if field.trim().is_empty() {
            return Err(MappingError::EmptyField { header });
        }
        if let Some((existing, _)) = self
            .entries
            .iter()
            .find(|(existing, target)| **target == field && **existing != header)
        {
            return Err(MappingError::FieldAlreadyMapped {
                field,
                header: existing.clone(),
            });
        }
        self.entries.insert(header, field);
        Ok(())
    }

    pub fn remove(&mut self, header: &str) -> Option<String> {
        self.entries.remove(header)
    }

    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.entries.get(header).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(header, field)| (header.as_str(), field.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every mapped cell present in `row` under its canonical key.
    pub fn apply(&self, row: &RawRecord) -> MappedRecord {
        self.entries
            .iter()
            .filter_map(|(header, field)| {
                row.get(header)
                    .map(|value| (field.clone(), value.clone()))
            })
            .collect()
    }

    pub fn coverage(&self, headers: &[String]) -> MappingCoverage {
        let present: BTreeSet<&str> = headers.iter().map(String::as_str).collect();
        let mut coverage = MappingCoverage::default();
        for (header, field) in &self.entries {
            if present.contains(header.as_str()) {
                coverage.mapped.push((header.clone(), field.clone()));
            } else {
                coverage.missing_headers.push(header.clone());
            }
        }
        coverage.unmapped_headers = headers
            .iter()
            .filter(|header| !self.entries.contains_key(header.as_str()))
            .cloned()
            .collect();
        coverage
    }
}

impl TryFrom<BTreeMap<String, String>> for ColumnMapping {
    type Error = MappingError;

    fn try_from(entries: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(entries)
    }
}

impl From<ColumnMapping> for BTreeMap<String, String> {
    fn from(mapping: ColumnMapping) -> Self {
        mapping.entries
    }
}
