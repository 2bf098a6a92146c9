//! User settings for the `fleet` binary.
//!
//! Stored as TOML in the platform config directory:
//! - Linux: ~/.config/fleet-admin/settings.toml
//! - macOS: ~/Library/Application Support/dev.fleet-admin.Fleet Admin/settings.toml
//! - Windows: %APPDATA%/fleet-admin/Fleet Admin/config/settings.toml

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use fleet_table::DEFAULT_ITEMS_PER_PAGE;

const APP_QUALIFIER: &str = "dev";
const APP_ORG: &str = "fleet-admin";
const APP_NAME: &str = "Fleet Admin";
const CONFIG_FILENAME: &str = "settings.toml";

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub layout: LayoutSettings,
    pub import: ImportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub items_per_page: usize,
    /// Longer cell text is cut with an ellipsis in `fleet view` tables.
    pub max_cell_width: usize,
    /// Cell width for the invalid and failed row tables after an import,
    /// whose error messages run longer than record fields.
    pub review_cell_width: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            max_cell_width: 40,
            review_cell_width: 80,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Directory for persisted column layouts; the platform data dir when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Sheet read when neither the command line nor the profile names one.
    pub default_sheet: Option<String>,
    /// Append one JSON summary line per import here.
    pub commit_log: Option<PathBuf>,
}

// =============================================================================
// PERSISTENCE
// =============================================================================

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
}

pub fn settings_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

impl Settings {
    /// Load from `path`, or from the platform default when `None`.
    ///
    /// Missing or unparseable files fall back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match settings_path() {
                Some(path) => path,
                None => {
                    tracing::warn!("could not determine settings path, using defaults");
                    return Self::default();
                }
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    tracing::debug!(path = %path.display(), "loaded settings");
                    settings
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to parse settings, using defaults: {e}");
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to read settings, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Write as TOML, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Where column layouts live.
    pub fn layout_dir(&self) -> PathBuf {
        self.layout.dir.clone().unwrap_or_else(|| {
            project_dirs().map_or_else(
                || PathBuf::from(".fleet").join("layouts"),
                |dirs| dirs.data_dir().join("layouts"),
            )
        })
    }
}
