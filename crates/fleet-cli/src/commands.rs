use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use comfy_table::{Attribute, Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{Instrument, info_span};

use fleet_cli::import::{ImportRequest, failed_rows_view, invalid_rows_view, run_import};
use fleet_cli::profile::Profile;
use fleet_cli::render::{
    apply_table_style, commit_summary, page_footer, validation_summary, view_table,
};
use fleet_cli::settings::{Settings, settings_path};
use fleet_cli::table::{ColumnsAction, ViewRequest, run_columns, run_view};
use fleet_import::ProgressFn;

use crate::cli::{ColumnsActionArg, ColumnsArgs, ImportArgs, SettingsArgs, ViewArgs};

/// Rows shown in the invalid/failed row tables.
const REVIEW_ROWS: usize = 20;

/// Returns the process exit code.
pub async fn run_import_command(args: &ImportArgs, settings: &Settings) -> Result<i32> {
    let profile = Profile::load(&args.profile)?;
    let request = ImportRequest {
        file: args.file.clone(),
        sheet: args
            .sheet
            .clone()
            .or_else(|| settings.import.default_sheet.clone()),
        dry_run: args.dry_run,
        sink: args.sink.clone(),
        commit_log: settings.import.commit_log.clone(),
    };
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} rows committed") {
        bar.set_style(style);
    }
    let progress: ProgressFn = {
        let bar = bar.clone();
        Arc::new(move |done: usize, total: usize| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
    };
    let outcome = run_import(&profile, &request, Some(progress))
        .instrument(info_span!("import", resource = %profile.resource))
        .await?;
    bar.finish_and_clear();

    let width = settings.display.review_cell_width;
    println!("{}", validation_summary(&outcome.validation));
    if let Some(view) = invalid_rows_view(&outcome.validation, REVIEW_ROWS)? {
        println!();
        println!("Invalid rows (skipped):");
        println!("{}", view_table(&view, width));
        if view.total_pages > 1 {
            println!("{}", page_footer(&view));
        }
    }

    let Some(commit) = &outcome.commit else {
        if args.dry_run {
            println!("Dry run: nothing committed.");
        } else {
            println!("No valid rows to commit.");
        }
        return Ok(0);
    };
    println!();
    println!("{}", commit_summary(commit));
    if let Some(view) = failed_rows_view(&outcome, REVIEW_ROWS)? {
        println!();
        println!("Failed rows:");
        println!("{}", view_table(&view, width));
    }
    if let Some(sink) = &outcome.sink {
        println!("{} → {}", commit.summary_line(), sink.display());
    }
    Ok(i32::from(outcome.has_failures()))
}

pub fn run_view_command(args: &ViewArgs, settings: &Settings) -> Result<()> {
    let profile = Profile::load(&args.profile)?;
    let request = ViewRequest {
        records: args.records.clone(),
        search: args.search.clone(),
        sort: args.sort.clone(),
        page: args.page,
        per_page: args.per_page,
        export: args.export.clone(),
    };
    let outcome = run_view(&profile, settings, &request)?;
    if outcome.view.rows.is_empty() {
        println!("No records match.");
    } else {
        println!(
            "{}",
            view_table(&outcome.view, settings.display.max_cell_width)
        );
    }
    println!("{}", page_footer(&outcome.view));
    if let Some(path) = &outcome.exported {
        println!("Exported {} rows to {}", outcome.view.filtered_count, path.display());
    }
    Ok(())
}

pub fn run_columns_command(args: &ColumnsArgs, settings: &Settings) -> Result<()> {
    let profile = Profile::load(&args.profile)?;
    let key = || {
        args.key
            .clone()
            .ok_or_else(|| anyhow!("a column KEY is required"))
    };
    let action = match args.action {
        ColumnsActionArg::Show => ColumnsAction::Show,
        ColumnsActionArg::Toggle => ColumnsAction::Toggle(key()?),
        ColumnsActionArg::Up => ColumnsAction::Up(key()?),
        ColumnsActionArg::Down => ColumnsAction::Down(key()?),
        ColumnsActionArg::Reset => ColumnsAction::Reset,
    };
    let (changed, lines) = run_columns(&profile, settings, &action)?;
    if !changed && matches!(action, ColumnsAction::Up(_) | ColumnsAction::Down(_)) {
        println!("Column is already at the edge; layout unchanged.");
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Key", "Label", "Visible"]);
    apply_table_style(&mut table);
    for (index, line) in lines.iter().enumerate() {
        let visible = if line.visible {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").add_attribute(Attribute::Dim)
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&line.key),
            Cell::new(&line.label),
            visible,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_settings_command(
    args: &SettingsArgs,
    settings: &Settings,
    config: Option<&Path>,
) -> Result<()> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => settings_path().context("could not determine the settings path")?,
    };
    if args.init {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        Settings::default().save_to(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }
    println!("# {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(settings).context("failed to render settings")?
    );
    println!("# layouts: {}", settings.layout_dir().display());
    Ok(())
}
