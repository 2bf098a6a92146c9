//! Import profiles: one TOML file per resource type.
//!
//! ```toml
//! resource = "vehicles"
//! sheet = "Vehicles"
//!
//! [mapping]
//! "Licence Plate" = "plate"
//! "Seats" = "seats"
//!
//! [[fields]]
//! key = "plate"
//! required = true
//! pattern = "^[A-Z0-9-]+$"
//!
//! [[fields]]
//! key = "seats"
//! kind = "integer"
//! min = 1
//!
//! [[columns]]
//! key = "plate"
//! label = "Plate"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use fleet_import::{ColumnMapping, FieldSpec, ImportValidationPipeline, RowSchema};
use fleet_model::{ColumnSet, ColumnSpec, DataRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Resource type: capability checks, layout storage key, default sink name.
    pub resource: String,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub mapping: ColumnMapping,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Columns for `fleet view`; one per field when empty.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read profile {}", path.display()))?;
        let profile: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse profile {}", path.display()))?;
        if profile.resource.trim().is_empty() {
            bail!("profile {} has an empty resource name", path.display());
        }
        tracing::debug!(
            resource = %profile.resource,
            fields = profile.fields.len(),
            mapped = profile.mapping.len(),
            "loaded profile"
        );
        Ok(profile)
    }

    pub fn pipeline(&self) -> Result<ImportValidationPipeline<RowSchema>> {
        if self.mapping.is_empty() {
            bail!("profile for '{}' has no [mapping] entries", self.resource);
        }
        let schema = RowSchema::new(self.fields.clone())
            .with_context(|| format!("invalid field rules for '{}'", self.resource))?;
        Ok(ImportValidationPipeline::new(self.mapping.clone(), schema))
    }

    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }
        self.fields
            .iter()
            .map(|field| ColumnSpec {
                key: field.key.clone(),
                label: field.key.clone(),
                sortable: true,
                default_visible: true,
            })
            .collect()
    }

    pub fn column_set(&self) -> Result<ColumnSet<DataRecord>> {
        let specs = self.column_specs();
        if specs.is_empty() {
            bail!("profile for '{}' declares no columns or fields", self.resource);
        }
        ColumnSet::from_specs(&specs)
            .with_context(|| format!("invalid columns for '{}'", self.resource))
    }
}
