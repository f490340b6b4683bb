//! Fetch engine seam: the synchronous call into the external media fetch and
//! transcode engine. The scheduler runs it on the blocking pool; tests inject
//! their own implementation.

mod args;
mod parse;
mod ytdlp;

pub use ytdlp::YtDlp;

use std::path::PathBuf;

use crate::job::JobSpec;
use crate::progress::ProgressSink;

/// What the engine reports after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Title of the remote media.
    pub title: String,
    /// Where the engine said it would write the file. Post-processing may
    /// have left a different file on disk; see `resolver`.
    pub predicted_path: PathBuf,
}

/// Failure of the fetch step for one job.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The engine ran and failed; the message is the engine's own.
    #[error("{0}")]
    Engine(String),
    /// The engine could not be started at all.
    #[error("media fetch engine not available: {0}")]
    Unavailable(String),
    #[error("engine I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Synchronous contract into the external media fetch engine.
///
/// `fetch` blocks for the whole network transfer and any transcoding. Every
/// call to `progress` happens before `fetch` returns.
pub trait FetchEngine: Send + Sync {
    fn fetch(
        &self,
        job: &JobSpec,
        progress: &mut dyn ProgressSink,
    ) -> Result<FetchOutcome, FetchError>;

    /// Check the engine can be started (e.g. the executable is on PATH).
    fn check_available(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
