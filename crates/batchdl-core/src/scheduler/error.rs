//! Batch-level errors: failures of the coordinating unit itself.

use std::io;
use std::path::PathBuf;

/// Fatal to the whole batch; reported instead of partial results.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The shared destination directory could not be listed, so no output
    /// can be resolved for any job.
    #[error("cannot enumerate destination directory {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
