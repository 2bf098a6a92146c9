//! `fleet`: fleet admin tables and bulk imports from the command line.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use fleet_cli::logging::{LogConfig, LogFormat, LogOutput, init_logging};
use fleet_cli::settings::Settings;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    run_columns_command, run_import_command, run_settings_command, run_view_command,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&log_config(&cli)) {
        eprintln!("error: cannot open log output: {error}");
        return ExitCode::FAILURE;
    }

    let settings = Settings::load(cli.config.as_deref());
    let result = match &cli.command {
        Command::Import(args) => run_import_command(args, &settings).await,
        Command::View(args) => run_view_command(args, &settings).map(|()| 0),
        Command::Columns(args) => run_columns_command(args, &settings).map(|()| 0),
        Command::Settings(args) => {
            run_settings_command(args, &settings, cli.config.as_deref()).map(|()| 0)
        }
    };
    match result {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            tracing::debug!("command failed: {error:?}");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// `--log-level` beats `-v`/`-q`; either one disables `RUST_LOG`.
fn log_config(cli: &Cli) -> LogConfig {
    let level = cli.log.level.map_or_else(
        || cli.verbosity.tracing_level_filter(),
        |level| match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        },
    );
    let output = cli
        .log
        .file
        .clone()
        .map_or(LogOutput::Stderr, LogOutput::File);
    let ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stderr().is_terminal(),
    };
    LogConfig {
        level,
        respect_rust_log: cli.log.level.is_none() && !cli.verbosity.is_present(),
        format: match cli.log.format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        output,
        ansi,
        log_data: cli.log.data,
        ..LogConfig::default()
    }
}
