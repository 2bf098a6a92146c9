//! CLI argument definitions for `fleet`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "fleet",
    version,
    about = "Fleet admin tables and bulk imports",
    long_about = "Browse fleet admin records as paged tables and bulk-import them from spreadsheets.\n\n\
                  Imports read xlsx, xls, xlsb, ods, csv and tsv files, validate every row against\n\
                  an import profile, and commit the valid rows one at a time."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// -v: info, -vv: debug, -vvv: trace, -q: errors only.
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    #[command(flatten)]
    pub color: Color,

    #[command(flatten)]
    pub log: LogArgs,

    /// Settings file (default: platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

/// Where logs go and what they contain.
#[derive(Args)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Fixed level; ignores -v/-q and RUST_LOG.
    #[arg(long = "log-level", value_enum, global = true, value_name = "LEVEL")]
    pub level: Option<LogLevelArg>,

    #[arg(long = "log-format", value_enum, global = true, default_value_t = LogFormatArg::Pretty)]
    pub format: LogFormatArg,

    /// Append logs to PATH rather than stderr.
    #[arg(long = "log-file", global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Include imported cell values in trace output.
    #[arg(long = "log-data", global = true)]
    pub data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a spreadsheet and commit its valid rows.
    Import(ImportArgs),

    /// Show one page of records through the table engine.
    View(ViewArgs),

    /// Show or change the persisted column layout.
    Columns(ColumnsArgs),

    /// Show the settings in effect, or write a default settings file.
    Settings(SettingsArgs),
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Spreadsheet to import (xlsx, xls, xlsb, ods, csv, tsv).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Import profile (TOML).
    #[arg(long = "profile", value_name = "TOML")]
    pub profile: PathBuf,

    /// Sheet to read (default: profile sheet, then settings, then the first sheet).
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheet: Option<String>,

    /// Validate and report without committing anything.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// JSON-lines file receiving committed records (default: <resource>.jsonl).
    #[arg(long = "sink", value_name = "PATH")]
    pub sink: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ViewArgs {
    /// Records as a JSON array, or a JSON-lines file.
    #[arg(value_name = "RECORDS")]
    pub records: PathBuf,

    #[arg(long = "profile", value_name = "TOML")]
    pub profile: PathBuf,

    /// Case-insensitive search over every field.
    #[arg(long = "search", value_name = "TERM")]
    pub search: Option<String>,

    /// Sort by column; repeat the same key to sort descending.
    #[arg(long = "sort", value_name = "KEY")]
    pub sort: Vec<String>,

    #[arg(long = "page", value_name = "N", default_value_t = 1)]
    pub page: usize,

    /// Rows per page (default: settings).
    #[arg(long = "per-page", value_name = "N")]
    pub per_page: Option<usize>,

    /// Write every matching row to an .xlsx or .csv file.
    #[arg(long = "export", value_name = "OUT")]
    pub export: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ColumnsArgs {
    #[arg(value_enum, default_value = "show")]
    pub action: ColumnsActionArg,

    /// Column key (toggle, up, down).
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    #[arg(long = "profile", value_name = "TOML")]
    pub profile: PathBuf,
}

#[derive(Parser)]
pub struct SettingsArgs {
    /// Write a settings file with defaults if none exists.
    #[arg(long = "init")]
    pub init: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColumnsActionArg {
    Show,
    Toggle,
    Up,
    Down,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
