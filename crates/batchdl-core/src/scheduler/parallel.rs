//! Run a batch of jobs concurrently under a hard worker cap.
//!
//! Keeps up to `max_concurrent` jobs running at once; when one finishes,
//! the next queued job is started until the queue is empty or admission
//! closes (abort, deadline, fatal error).

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::control::{Admission, BatchControl, ABORTED_BEFORE_START};
use crate::engine::FetchEngine;
use crate::job::{JobIndex, JobResult, JobSpec, JobState};
use crate::progress::ProgressStore;

use super::error::BatchError;
use super::execute::{finish, run_one_job};

/// Bounded-concurrency dispatcher for one batch.
///
/// The store is injected so the caller can poll `snapshot()` while `run` is
/// in progress; the control handle can be cloned out to stop admission.
pub struct JobScheduler {
    engine: Arc<dyn FetchEngine>,
    store: ProgressStore,
    control: BatchControl,
    deadline: Option<Duration>,
}

impl JobScheduler {
    pub fn new(engine: Arc<dyn FetchEngine>, store: ProgressStore) -> Self {
        Self {
            engine,
            store,
            control: BatchControl::new(),
            deadline: None,
        }
    }

    /// Use an externally owned abort handle.
    pub fn with_control(mut self, control: BatchControl) -> Self {
        self.control = control;
        self
    }

    /// Stop admitting jobs once `deadline` has elapsed since `run` started.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn control(&self) -> &BatchControl {
        &self.control
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Runs every job and returns exactly one result per job, in no
    /// particular order (key by `JobResult::index` for display).
    ///
    /// At most `max_concurrent` (at least 1) fetches run at any time. Jobs
    /// not admitted before an abort get an error result. Returns `Err` only
    /// when the coordinating unit itself fails; in-flight jobs are drained
    /// first.
    pub async fn run(
        &self,
        jobs: Vec<JobSpec>,
        max_concurrent: usize,
    ) -> Result<Vec<JobResult>, BatchError> {
        let max_concurrent = max_concurrent.max(1);
        let admission = Admission::new(self.control.clone(), self.deadline);
        tracing::info!(jobs = jobs.len(), max_concurrent, "batch started");

        let mut pending: BTreeMap<JobIndex, String> = BTreeMap::new();
        for job in &jobs {
            self.store.update(job.index, JobState::Queued, 0.0, "queued");
            pending.insert(job.index, job.url.clone());
        }

        let mut queue: VecDeque<JobSpec> = jobs.into();
        let mut results = Vec::with_capacity(pending.len());
        let mut fatal: Option<BatchError> = None;
        let mut join_set = JoinSet::new();

        loop {
            while join_set.len() < max_concurrent && !queue.is_empty() && admission.open() {
                let Some(job) = queue.pop_front() else {
                    break;
                };
                let engine = Arc::clone(&self.engine);
                let store = self.store.clone();
                join_set.spawn(run_one_job(job, engine, store));
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok(Ok(result)) => {
                    pending.remove(&result.index);
                    results.push(result);
                }
                Ok(Err(e)) => {
                    tracing::error!("batch failed: {}", e);
                    admission.close();
                    fatal.get_or_insert(e);
                }
                Err(e) => tracing::error!("job task join: {}", e),
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        for job in queue {
            pending.remove(&job.index);
            let result = JobResult::error(job.index, job.url, ABORTED_BEFORE_START);
            results.push(finish(&self.store, result));
        }
        // Whatever is still pending lost its task to a panic outside the fetch.
        for (index, url) in pending {
            let result = JobResult::error(index, url, "worker task failed");
            results.push(finish(&self.store, result));
        }

        tracing::info!(results = results.len(), "batch finished");
        Ok(results)
    }
}
