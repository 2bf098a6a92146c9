//! `fleet view` and `fleet columns`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::Value as JsonValue;

use fleet_layout::{ColumnLayoutStore, JsonFileStore, KeyValueStore, MoveDirection};
use fleet_model::{DataRecord, DeclaredColumn};
use fleet_table::{TableView, TableViewEngine};

use crate::profile::Profile;
use crate::settings::Settings;
use crate::sink::read_json_lines;

/// Records from a JSON array file, or a JSON-lines file (`.jsonl`) such as an import sink.
pub fn load_records(path: &Path) -> Result<Vec<DataRecord>> {
    let is_json_lines = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));
    let values = if is_json_lines {
        read_json_lines(path)?
    } else {
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str(&content)
            .with_context(|| format!("{} is not valid JSON", path.display()))?
        {
            JsonValue::Array(values) => values,
            _ => bail!("{} must hold a JSON array of records", path.display()),
        }
    };
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            DataRecord::try_from(value)
                .with_context(|| format!("record {} in {}", index + 1, path.display()))
        })
        .collect()
}

fn layout_store(settings: &Settings) -> Arc<dyn KeyValueStore> {
    Arc::new(JsonFileStore::new(settings.layout_dir()))
}

#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    pub records: PathBuf,
    pub search: Option<String>,
    /// Applied in order; naming the same key twice sorts it descending.
    pub sort: Vec<String>,
    pub page: usize,
    pub per_page: Option<usize>,
    pub export: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ViewOutcome {
    pub view: TableView,
    pub exported: Option<PathBuf>,
}

pub fn open_engine(
    profile: &Profile,
    settings: &Settings,
    records: Vec<DataRecord>,
) -> Result<TableViewEngine<DataRecord>> {
    let columns = profile.column_set()?;
    Ok(
        TableViewEngine::new(columns, layout_store(settings), profile.resource.clone())
            .with_records(records)
            .with_items_per_page(settings.display.items_per_page),
    )
}

pub fn run_view(profile: &Profile, settings: &Settings, request: &ViewRequest) -> Result<ViewOutcome> {
    let records = load_records(&request.records)?;
    tracing::info!(records = records.len(), resource = %profile.resource, "loaded records");
    let mut engine = open_engine(profile, settings, records)?;

    if let Some(per_page) = request.per_page {
        engine.set_items_per_page(per_page);
    }
    if let Some(term) = &request.search {
        engine.set_search_term(term.as_str());
    }
    for key in &request.sort {
        match engine.columns().get(key) {
            None => bail!("unknown sort column '{key}'"),
            Some(column) if !column.sortable => bail!("column '{key}' is not sortable"),
            Some(_) => {}
        }
        engine.set_sort(key);
    }
    engine.set_page(request.page);

    let exported = match &request.export {
        Some(path) => {
            export(&engine, path, &profile.resource)?;
            Some(path.clone())
        }
        None => None,
    };
    Ok(ViewOutcome {
        view: engine.view(),
        exported,
    })
}

fn export(engine: &TableViewEngine<DataRecord>, path: &Path, resource: &str) -> Result<()> {
    let table = engine.project_for_export()?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx") => {
            let sheet: String = resource.chars().take(31).collect();
            table.write_xlsx(path, &sheet)?;
        }
        Some("csv") => table.write_csv(path)?,
        _ => bail!("export path {} must end in .xlsx or .csv", path.display()),
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnsAction {
    Show,
    Toggle(String),
    Up(String),
    Down(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLine {
    pub key: String,
    pub label: String,
    pub visible: bool,
}

/// Apply `action` to the persisted layout and list the columns in display order.
///
/// Returns whether the layout changed.
pub fn run_columns(
    profile: &Profile,
    settings: &Settings,
    action: &ColumnsAction,
) -> Result<(bool, Vec<ColumnLine>)> {
    let specs = profile.column_specs();
    let mut layout = ColumnLayoutStore::open(layout_store(settings), profile.resource.clone(), &specs);

    let ensure_known = |key: &str| -> Result<()> {
        if specs.iter().any(|spec| spec.key() == key) {
            Ok(())
        } else {
            bail!("unknown column '{key}'")
        }
    };
    let changed = match action {
        ColumnsAction::Show => false,
        ColumnsAction::Toggle(key) => {
            ensure_known(key)?;
            layout.toggle(key)
        }
        ColumnsAction::Up(key) => {
            ensure_known(key)?;
            layout.move_column(key, MoveDirection::Up)
        }
        ColumnsAction::Down(key) => {
            ensure_known(key)?;
            layout.move_column(key, MoveDirection::Down)
        }
        ColumnsAction::Reset => {
            layout.reset(&specs);
            true
        }
    };

    let lines = layout
        .state()
        .order
        .iter()
        .filter_map(|key| specs.iter().find(|spec| &spec.key == key))
        .map(|spec| ColumnLine {
            key: spec.key.clone(),
            label: spec.label.clone(),
            visible: layout.is_visible(&spec.key),
        })
        .collect();
    Ok((changed, lines))
}
