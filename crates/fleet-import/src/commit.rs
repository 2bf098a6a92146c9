//! Sequential commit of validated rows.
//!
//! Rows are submitted one at a time, each awaited before the next starts.
//! Report order matches input order, and a failed row never stops the rows
//! after it.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use fleet_model::{CommitOutcome, Mutations};

pub const CANCELLED_ERROR: &str = "cancelled before submission";

/// Per-row progress hook: `(done, total)`.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Extension points for the commit loop. The defaults submit every row
/// exactly once with no way to stop early.
#[derive(Debug, Clone)]
pub struct CommitOptions {
    pub cancellation: Option<CancellationToken>,
    /// Submission attempts per row, at least 1.
    pub max_attempts: u32,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            cancellation: None,
            max_attempts: 1,
        }
    }
}

impl CommitOptions {
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    /// No row failed.
    CleanSuccess,
    /// No row succeeded.
    CleanFailure,
    Mixed,
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CleanSuccess => "success",
            Self::CleanFailure => "failure",
            Self::Mixed => "mixed result",
        })
    }
}

/// One outcome per submitted row, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReport<T> {
    /// Aligned with the submitted rows.
    pub outcomes: Vec<CommitOutcome<T>>,
    /// Rows the mutation callback accepted.
    pub succeeded: usize,
    /// Rejected, errored or cancelled rows.
    pub failed: usize,
    /// The cancellation token fired before every row was submitted.
    pub cancelled: bool,
}

impl<T> CommitReport<T> {
    pub fn from_outcomes(outcomes: Vec<CommitOutcome<T>>, cancelled: bool) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        Self {
            failed: outcomes.len() - succeeded,
            succeeded,
            outcomes,
            cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// A zero-row commit counts as a clean success.
    pub fn status(&self) -> CommitStatus {
        if self.failed == 0 {
            CommitStatus::CleanSuccess
        } else if self.succeeded == 0 {
            CommitStatus::CleanFailure
        } else {
            CommitStatus::Mixed
        }
    }

    pub fn summary_line(&self) -> String {
        let line = format!("{} succeeded, {} failed", self.succeeded, self.failed);
        if self.cancelled {
            format!("{line} (cancelled)")
        } else {
            line
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &CommitOutcome<T>)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.success)
    }
}

/// Submits rows through a host [`Mutations::add`] callback.
pub struct ImportCommitExecutor<'a, M: ?Sized> {
    mutations: &'a M,
    options: CommitOptions,
    progress: Option<ProgressFn>,
}

impl<'a, M: ?Sized> ImportCommitExecutor<'a, M> {
    pub fn new(mutations: &'a M) -> Self {
        Self {
            mutations,
            options: CommitOptions::default(),
            progress: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CommitOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn commit<T>(&self, rows: Vec<T>) -> CommitReport<T>
    where
        T: Send + Sync,
        M: Mutations<T>,
    {
        let total = rows.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = false;
        for (index, row) in rows.into_iter().enumerate() {
            if !cancelled && self.options.is_cancelled() {
                cancelled = true;
                tracing::info!(submitted = index, remaining = total - index, "commit cancelled");
            }
            let outcome = if cancelled {
                CommitOutcome::failed(row, CANCELLED_ERROR)
            } else {
                self.submit(row).await
            };
            tracing::debug!(row = index + 1, success = outcome.success, "row committed");
            outcomes.push(outcome);
            if let Some(progress) = &self.progress {
                progress(index + 1, total);
            }
        }
        let report = CommitReport::from_outcomes(outcomes, cancelled);
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            status = %report.status(),
            "commit finished"
        );
        report
    }

    async fn submit<T>(&self, row: T) -> CommitOutcome<T>
    where
        T: Send + Sync,
        M: Mutations<T>,
    {
        let mut attempt = 1;
        loop {
            let result = self.mutations.add(&row).await;
            let accepted = matches!(&result, Ok(response) if response.success);
            if accepted || attempt >= self.options.max_attempts || self.options.is_cancelled() {
                return match result {
                    Ok(response) => CommitOutcome::from_response(row, response),
                    Err(error) => CommitOutcome::failed(row, error.to_string()),
                };
            }
            tracing::debug!(attempt, "submission failed; retrying");
            attempt += 1;
        }
    }
}

impl<M: ?Sized> fmt::Debug for ImportCommitExecutor<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportCommitExecutor")
            .field("options", &self.options)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
