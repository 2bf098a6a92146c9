//! Subscriber setup for the `fleet` binary.
//!
//! Levels, by convention across the fleet crates:
//!
//! - `error`: fatal file errors
//! - `warn`: persistence failures, mapped headers missing from a file
//! - `info`: stage progress and summary counts
//! - `debug`: per-row outcomes
//! - `trace`: row values, redacted unless `--log-data` is passed

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

static ROW_DATA: AtomicBool = AtomicBool::new(false);

pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Log targets that follow the chosen level. Dependencies stay at `warn`.
const OWN_TARGETS: [&str; 7] = [
    "fleet",
    "fleet_cli",
    "fleet_import",
    "fleet_ingest",
    "fleet_layout",
    "fleet_model",
    "fleet_table",
];

/// `value` if `--log-data` was given, [`REDACTED_VALUE`] otherwise.
pub fn redact_value(value: &str) -> &str {
    if ROW_DATA.load(Ordering::Relaxed) {
        value
    } else {
        REDACTED_VALUE
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stderr,
    /// Appended to; created if missing.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// `RUST_LOG` wins over `level` when set.
    pub respect_rust_log: bool,
    pub format: LogFormat,
    pub output: LogOutput,
    pub ansi: bool,
    pub timestamps: bool,
    pub show_targets: bool,
    pub log_data: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            respect_rust_log: true,
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            ansi: true,
            timestamps: false,
            show_targets: false,
            log_data: false,
        }
    }
}

impl LogConfig {
    /// Directive string used when `RUST_LOG` is absent or ignored.
    pub fn directives(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        OWN_TARGETS
            .iter()
            .fold(String::from("warn"), |mut acc, target| {
                acc.push_str(&format!(",{target}={level}"));
                acc
            })
    }

    fn env_filter(&self) -> EnvFilter {
        let from_env = self
            .respect_rust_log
            .then(|| EnvFilter::try_from_default_env().ok())
            .flatten();
        from_env.unwrap_or_else(|| EnvFilter::new(self.directives()))
    }

    fn writer(&self) -> io::Result<BoxMakeWriter> {
        Ok(match &self.output {
            LogOutput::Stderr => BoxMakeWriter::new(io::stderr),
            LogOutput::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        })
    }

    fn layer(&self, writer: BoxMakeWriter) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_writer(writer)
            .with_target(self.show_targets)
            .with_ansi(self.ansi && self.output == LogOutput::Stderr);
        match (self.format, self.timestamps) {
            (LogFormat::Json, _) => base.json().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
            (LogFormat::Pretty, true) => base.boxed(),
            (LogFormat::Pretty, false) => base.without_time().boxed(),
        }
    }
}

/// Install the global subscriber. Call once, before any command runs.
///
/// # Errors
///
/// The log file could not be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    ROW_DATA.store(config.log_data, Ordering::Relaxed);
    let layer = config.layer(config.writer()?);
    tracing_subscriber::registry()
        .with(layer)
        .with(config.env_filter())
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_raise_only_fleet_targets() {
        let config = LogConfig {
            level: LevelFilter::DEBUG,
            ..LogConfig::default()
        };
        let directives = config.directives();
        assert!(directives.starts_with("warn,fleet=debug,"));
        assert!(directives.contains("fleet_import=debug"));
        assert!(directives.ends_with("fleet_table=debug"));
    }

    #[test]
    fn row_values_are_hidden_by_default() {
        assert_eq!(redact_value("AB-123"), REDACTED_VALUE);
    }

    #[test]
    fn file_output_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.log");
        let config = LogConfig {
            output: LogOutput::File(path.clone()),
            ..LogConfig::default()
        };
        config.writer().unwrap();
        assert!(path.exists());
    }
}
