//! Result aggregation: batch summary, retrievable files, bulk archive.
//!
//! Nothing here caches filesystem state: every listing re-checks that the
//! backing file still exists at call time.

mod archive;
mod files;

pub use archive::{package_archive, write_archive};
pub use files::{list_retrievable_files, open_file, scan_directory, DownloadedFile, RetrievalError};

use serde::Serialize;

use crate::job::{JobResult, ResultState};

/// Counts by terminal state for one batch. Recomputed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub warning: usize,
    pub error: usize,
}

impl BatchSummary {
    /// Batch-level failure message when every submitted job failed.
    pub fn aggregate_failure(&self) -> Option<String> {
        if self.total > 0 && self.error == self.total {
            Some(format!("all {} download(s) failed", self.total))
        } else {
            None
        }
    }
}

/// Counts results by terminal state.
pub fn summarize(results: &[JobResult]) -> BatchSummary {
    results.iter().fold(
        BatchSummary {
            total: results.len(),
            ..BatchSummary::default()
        },
        |mut acc, r| {
            match r.state {
                ResultState::Success => acc.success += 1,
                ResultState::Warning => acc.warning += 1,
                ResultState::Error => acc.error += 1,
            }
            acc
        },
    )
}
