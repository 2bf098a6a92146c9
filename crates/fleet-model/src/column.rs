//! Column declarations for tabular views.
//!
//! A [`ColumnDescriptor`] addresses a record field by `key`, or computes a
//! synthetic value through its `render` strategy. A [`ColumnSet`] guarantees
//! key uniqueness.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CellValue, ModelError, Record};

/// Per-column display strategy.
pub type RenderFn<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// The parts of a column the layout store cares about.
pub trait DeclaredColumn {
    fn key(&self) -> &str;
    fn default_visible(&self) -> bool;
}

pub struct ColumnDescriptor<T> {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub default_visible: bool,
    render: Option<RenderFn<T>>,
}

impl<T> ColumnDescriptor<T> {
    /// Sortable and visible by default.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: true,
            default_visible: true,
            render: None,
        }
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    #[must_use]
    pub fn visible_by_default(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }

    #[must_use]
    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }
}

impl<T: Record> ColumnDescriptor<T> {
    /// Raw field value addressed by `key`, ignoring `render`. Used for sorting.
    pub fn raw_value(&self, record: &T) -> CellValue {
        record.value(&self.key)
    }

    /// Display value: `render` when present, else the raw field value.
    pub fn cell(&self, record: &T) -> CellValue {
        match &self.render {
            Some(render) => render(record),
            None => record.value(&self.key),
        }
    }
}

impl<T> Clone for ColumnDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            default_visible: self.default_visible,
            render: self.render.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("default_visible", &self.default_visible)
            .field("has_render", &self.render.is_some())
            .finish()
    }
}

impl<T> DeclaredColumn for ColumnDescriptor<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn default_visible(&self) -> bool {
        self.default_visible
    }
}

/// Serializable column declaration (profile files).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub default_visible: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnSpec {
    pub fn to_descriptor<T>(&self) -> ColumnDescriptor<T> {
        ColumnDescriptor::new(self.key.clone(), self.label.clone())
            .sortable(self.sortable)
            .visible_by_default(self.default_visible)
    }
}

impl DeclaredColumn for ColumnSpec {
    fn key(&self) -> &str {
        &self.key
    }

    fn default_visible(&self) -> bool {
        self.default_visible
    }
}

/// An ordered column declaration with unique, non-blank keys.
pub struct ColumnSet<T> {
    columns: Vec<ColumnDescriptor<T>>,
}

impl<T> ColumnSet<T> {
    pub fn new(columns: Vec<ColumnDescriptor<T>>) -> Result<Self, ModelError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.key.trim().is_empty() {
                return Err(ModelError::InvalidColumnKey(column.key.clone()));
            }
            if !seen.insert(column.key.as_str()) {
                return Err(ModelError::DuplicateColumnKey(column.key.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn from_specs(specs: &[ColumnSpec]) -> Result<Self, ModelError> {
        Self::new(specs.iter().map(ColumnSpec::to_descriptor).collect())
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor<T>> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDescriptor<T>> {
        self.columns.iter()
    }

    pub fn as_slice(&self) -> &[ColumnDescriptor<T>] {
        &self.columns
    }

    pub fn keys(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<T> Clone for ColumnSet<T> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.columns.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a ColumnSet<T> {
    type Item = &'a ColumnDescriptor<T>;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataRecord, RecordId};

    #[test]
    fn rejects_duplicate_keys() {
        let err = ColumnSet::<DataRecord>::new(vec![
            ColumnDescriptor::new("plate", "Plate"),
            ColumnDescriptor::new("plate", "Plate again"),
        ])
        .unwrap_err();
        assert_eq!(err, ModelError::DuplicateColumnKey("plate".to_string()));
    }

    #[test]
    fn render_overrides_field_value() {
        let column = ColumnDescriptor::<DataRecord>::new("summary", "Summary")
            .with_render(|record| CellValue::Text(format!("#{}", record.id)));
        let record = DataRecord::new(RecordId::new("9").unwrap());
        assert_eq!(column.cell(&record), CellValue::from("#9"));
        assert_eq!(column.raw_value(&record), CellValue::Null);
    }

    #[test]
    fn spec_defaults_to_sortable_and_visible() {
        let spec: ColumnSpec = serde_json::from_str(r#"{"key":"vin","label":"VIN"}"#).unwrap();
        assert!(spec.sortable);
        assert!(spec.default_visible);
    }
}
