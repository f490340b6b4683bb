//! Batch session: the submission surface. Owns the per-batch lifecycle
//! (fresh store, results replaced wholesale) and the capped history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::aggregate::{
    list_retrievable_files, package_archive, summarize, BatchSummary, DownloadedFile,
    RetrievalError,
};
use crate::control::BatchControl;
use crate::engine::FetchEngine;
use crate::history::{BatchRecord, History};
use crate::job::JobResult;
use crate::progress::ProgressStore;
use crate::scheduler::{BatchError, JobScheduler};
use crate::validate::{BatchRequest, RejectedUrl, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Everything a caller needs to render a finished batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub summary: BatchSummary,
    /// Batch-level failure message when every job failed.
    pub failure: Option<String>,
    /// One per scheduled job, ordered by job index.
    pub results: Vec<JobResult>,
    /// Files present on disk when the batch finished.
    pub files: Vec<DownloadedFile>,
    pub rejected: Vec<RejectedUrl>,
}

pub struct BatchSession {
    engine: Arc<dyn FetchEngine>,
    store: ProgressStore,
    control: BatchControl,
    results: Vec<JobResult>,
    history: History,
}

impl BatchSession {
    pub fn new(engine: Arc<dyn FetchEngine>, history_limit: usize) -> Self {
        Self {
            engine,
            store: ProgressStore::new(),
            control: BatchControl::new(),
            results: Vec::new(),
            history: History::new(history_limit),
        }
    }

    /// Handle to the live status map; poll `snapshot()` while `submit` runs.
    pub fn progress(&self) -> ProgressStore {
        self.store.clone()
    }

    /// Abort handle for the next batch. `submit` consumes it and installs a
    /// fresh one, so take it before calling `submit`.
    pub fn control(&self) -> BatchControl {
        self.control.clone()
    }

    /// Validates and runs one batch, replacing the previous batch's results.
    pub async fn submit(&mut self, request: BatchRequest) -> Result<BatchReport, SessionError> {
        let batch = request.validate()?;
        let started_at = Utc::now();

        self.store.clear();
        self.results.clear();

        let control = std::mem::take(&mut self.control);
        let scheduler = JobScheduler::new(Arc::clone(&self.engine), self.store.clone())
            .with_control(control)
            .with_deadline(request.deadline);
        let mut results = scheduler.run(batch.jobs, batch.max_concurrency).await?;
        results.sort_by_key(|r| r.index);

        let summary = summarize(&results);
        let failure = summary.aggregate_failure();
        if let Some(msg) = &failure {
            tracing::warn!("{}", msg);
        }
        tracing::info!(
            total = summary.total,
            success = summary.success,
            warning = summary.warning,
            error = summary.error,
            rejected = batch.rejected.len(),
            "batch summary"
        );

        self.history.record(BatchRecord::from_results(
            started_at,
            request.kind,
            &results,
            summary,
        ));
        let files = list_retrievable_files(&results);
        self.results = results;

        Ok(BatchReport {
            started_at,
            summary,
            failure,
            results: self.results.clone(),
            files,
            rejected: batch.rejected,
        })
    }

    /// Results of the most recent batch.
    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    pub fn summary(&self) -> BatchSummary {
        summarize(&self.results)
    }

    /// Re-checked on every call; files deleted since the batch are omitted.
    pub fn retrievable_files(&self) -> Vec<DownloadedFile> {
        list_retrievable_files(&self.results)
    }

    /// Zip of every file of the last batch that still exists.
    pub fn package_archive(&self) -> Result<Option<Vec<u8>>, RetrievalError> {
        package_archive(&self.retrievable_files())
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}
