//! Progress store: per-job status shared between workers and observers.
//!
//! Workers write whole `JobStatus` records under one lock; observers take a
//! `snapshot()` copy and iterate it at their own cadence while workers keep
//! writing to the original.

mod sink;

pub use sink::{JobProgress, ProgressSink};

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::job::{JobIndex, JobState, JobStatus};

/// Shared, cheaply clonable handle to the per-batch status map.
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    inner: Arc<Mutex<HashMap<JobIndex, JobStatus>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A worker panicking while holding the lock cannot leave a torn record:
    // every write replaces a whole entry.
    fn lock(&self) -> MutexGuard<'_, HashMap<JobIndex, JobStatus>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the status of `job`. Returns false (and leaves the entry as is)
    /// when the job already reached a terminal state.
    pub fn update(
        &self,
        job: JobIndex,
        state: JobState,
        percent: f64,
        message: impl Into<String>,
    ) -> bool {
        let status = JobStatus::new(state, percent, message);
        let mut map = self.lock();
        if let Some(current) = map.get(&job) {
            if current.state.is_terminal() {
                tracing::debug!(
                    job = %job,
                    current = current.state.as_str(),
                    refused = state.as_str(),
                    "ignoring update to terminal job"
                );
                return false;
            }
        }
        map.insert(job, status);
        true
    }

    /// Consistent copy of every entry, ordered by job index.
    pub fn snapshot(&self) -> BTreeMap<JobIndex, JobStatus> {
        self.lock()
            .iter()
            .map(|(job, status)| (*job, status.clone()))
            .collect()
    }

    pub fn get(&self, job: JobIndex) -> Option<JobStatus> {
        self.lock().get(&job).cloned()
    }

    /// Drop every entry (start of a new batch).
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of jobs currently holding a concurrency slot.
    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|s| s.state.is_active()).count()
    }
}
