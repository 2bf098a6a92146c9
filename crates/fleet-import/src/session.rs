use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use fleet_ingest::IngestOptions;
use fleet_model::Mutations;

use crate::commit::{CommitOptions, CommitReport, ImportCommitExecutor, ProgressFn};
use crate::error::SessionError;
use crate::pipeline::{ImportValidationPipeline, ValidationReport};
use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    FileSelected,
    Validating,
    Validated,
    Committing,
    Completed,
    Failed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::FileSelected => "file selected",
            Self::Validating => "validating",
            Self::Validated => "validated",
            Self::Committing => "committing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

#[derive(Debug)]
pub enum SessionState<T> {
    Idle,
    FileSelected {
        path: PathBuf,
    },
    Validating {
        path: PathBuf,
    },
    Validated {
        path: PathBuf,
        report: ValidationReport<T>,
    },
    Committing {
        path: PathBuf,
        valid_count: usize,
    },
    Completed {
        path: PathBuf,
        validation: ValidationReport<T>,
        commit: CommitReport<T>,
    },
    /// The file could not be parsed; nothing was validated or committed.
    Failed {
        path: PathBuf,
        error: String,
    },
}

impl<T> SessionState<T> {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle => SessionPhase::Idle,
            Self::FileSelected { .. } => SessionPhase::FileSelected,
            Self::Validating { .. } => SessionPhase::Validating,
            Self::Validated { .. } => SessionPhase::Validated,
            Self::Committing { .. } => SessionPhase::Committing,
            Self::Completed { .. } => SessionPhase::Completed,
            Self::Failed { .. } => SessionPhase::Failed,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Idle => None,
            Self::FileSelected { path }
            | Self::Validating { path }
            | Self::Validated { path, .. }
            | Self::Committing { path, .. }
            | Self::Completed { path, .. }
            | Self::Failed { path, .. } => Some(path),
        }
    }
}

/// One file-to-commit import workflow.
///
/// `Idle -> FileSelected -> Validating -> Validated -> Committing -> Completed`,
/// with `Failed` when the file cannot be parsed. [`ImportSession::reset`]
/// returns to `Idle` from anywhere and discards everything.
pub struct ImportSession<T: Send + Sync, S> {
    pipeline: ImportValidationPipeline<S>,
    mutations: Arc<dyn Mutations<T>>,
    ingest: IngestOptions,
    state: SessionState<T>,
}

impl<T, S> ImportSession<T, S>
where
    T: Clone + Send + Sync,
    S: Schema<T>,
{
    pub fn new(pipeline: ImportValidationPipeline<S>, mutations: Arc<dyn Mutations<T>>) -> Self {
        Self {
            pipeline,
            mutations,
            ingest: IngestOptions::default(),
            state: SessionState::Idle,
        }
    }

    #[must_use]
    pub fn with_ingest_options(mut self, options: IngestOptions) -> Self {
        self.ingest = options;
        self
    }

    pub fn state(&self) -> &SessionState<T> {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Choose the file to import; any previous results are discarded.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> Result<(), SessionError> {
        self.ensure_not_busy("select a file")?;
        self.state = SessionState::FileSelected { path: path.into() };
        Ok(())
    }

    pub async fn validate(&mut self) -> Result<&ValidationReport<T>, SessionError> {
        let SessionState::FileSelected { path } = &self.state else {
            return Err(self.invalid("validate"));
        };
        let path = path.clone();
        self.state = SessionState::Validating { path: path.clone() };

        match self
            .pipeline
            .validate_file_async(path.clone(), self.ingest.clone())
            .await
        {
            Ok(report) => {
                self.state = SessionState::Validated { path, report };
                match &self.state {
                    SessionState::Validated { report, .. } => Ok(report),
                    _ => Err(self.invalid("validate")),
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), "import file rejected: {error}");
                self.state = SessionState::Failed {
                    path,
                    error: error.to_string(),
                };
                Err(SessionError::Ingest(error))
            }
        }
    }

    /// Commit the valid rows. There is no way back to `Validated` once this
    /// starts; cancellation goes through `options`.
    pub async fn confirm(
        &mut self,
        options: CommitOptions,
        progress: Option<ProgressFn>,
    ) -> Result<&CommitReport<T>, SessionError> {
        let valid_count = match &self.state {
            SessionState::Validated { report, .. } => report.valid_count,
            _ => return Err(self.invalid("commit")),
        };
        if valid_count == 0 {
            return Err(SessionError::NothingToCommit);
        }
        let SessionState::Validated { path, report } = mem::replace(&mut self.state, SessionState::Idle)
        else {
            return Err(self.invalid("commit"));
        };
        self.state = SessionState::Committing {
            path: path.clone(),
            valid_count,
        };

        let rows: Vec<T> = report.valid_rows().cloned().collect();
        let commit = ImportCommitExecutor::new(self.mutations.as_ref())
            .with_options(options)
            .with_progress(progress)
            .commit(rows)
            .await;

        self.state = SessionState::Completed {
            path,
            validation: report,
            commit,
        };
        match &self.state {
            SessionState::Completed { commit, .. } => Ok(commit),
            _ => Err(self.invalid("commit")),
        }
    }

    fn ensure_not_busy(&self, action: &'static str) -> Result<(), SessionError> {
        match self.phase() {
            SessionPhase::Validating | SessionPhase::Committing => Err(self.invalid(action)),
            _ => Ok(()),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.phase(),
            action,
        }
    }
}

impl<T: Send + Sync, S> fmt::Debug for ImportSession<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportSession")
            .field("phase", &self.state.phase())
            .field("path", &self.state.path())
            .finish_non_exhaustive()
    }
}
