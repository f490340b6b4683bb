//! Per-job status (mutable, lives in the progress store) and per-job result
//! (immutable, produced once when the worker finishes).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::{JobIndex, MediaKind};

/// Lifecycle state of a job as seen by progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Starting,
    Downloading,
    Finished,
    Warning,
    Error,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Starting => "starting",
            JobState::Downloading => "downloading",
            JobState::Finished => "finished",
            JobState::Warning => "warning",
            JobState::Error => "error",
        }
    }

    /// Terminal states never transition again for the same job.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Finished | JobState::Warning | JobState::Error)
    }

    /// True while the job holds a concurrency slot.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Starting | JobState::Downloading)
    }
}

/// Point-in-time status of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    /// Progress in [0, 100].
    pub percent: f64,
    pub message: String,
    pub last_updated: DateTime<Utc>,
}

impl JobStatus {
    pub fn new(state: JobState, percent: f64, message: impl Into<String>) -> Self {
        Self {
            state,
            percent: clamp_percent(percent),
            message: message.into(),
            last_updated: Utc::now(),
        }
    }
}

pub(crate) fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultState {
    Success,
    /// The engine reported success but no output file could be located.
    Warning,
    Error,
}

impl ResultState {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultState::Success => "success",
            ResultState::Warning => "warning",
            ResultState::Error => "error",
        }
    }

    /// Store state matching this outcome.
    pub fn job_state(self) -> JobState {
        match self {
            ResultState::Success => JobState::Finished,
            ResultState::Warning => JobState::Warning,
            ResultState::Error => JobState::Error,
        }
    }
}

/// Produced exactly once per submitted job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub index: JobIndex,
    pub url: String,
    /// Title reported by the engine; absent when the fetch failed early.
    pub title: Option<String>,
    pub state: ResultState,
    pub message: String,
    /// Resolved output file for `Success`; the engine's predicted path for
    /// `Warning` (re-resolved at retrieval time); never set for `Error`.
    pub output: Option<PathBuf>,
    /// Requested kind, kept on warnings so retrieval applies the same
    /// extension allow-list as the resolver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
}

impl JobResult {
    pub fn success(
        index: JobIndex,
        url: impl Into<String>,
        title: impl Into<String>,
        output: PathBuf,
    ) -> Self {
        let message = format!("saved {}", output.display());
        Self {
            index,
            url: url.into(),
            title: Some(title.into()),
            state: ResultState::Success,
            message,
            output: Some(output),
            kind: None,
        }
    }

    pub fn warning(
        index: JobIndex,
        url: impl Into<String>,
        title: impl Into<String>,
        kind: MediaKind,
        predicted: Option<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            url: url.into(),
            title: Some(title.into()),
            state: ResultState::Warning,
            message: message.into(),
            output: predicted,
            kind: Some(kind),
        }
    }

    pub fn error(index: JobIndex, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            title: None,
            state: ResultState::Error,
            message: message.into(),
            output: None,
            kind: None,
        }
    }

    /// Title if known, else the source URL.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}
