//! One worker: fetch a job end to end and produce its terminal result.

use std::sync::Arc;

use crate::engine::FetchEngine;
use crate::job::{JobResult, JobSpec, JobState, ResultState};
use crate::progress::{JobProgress, ProgressStore};
use crate::resolver::resolve_output;

use super::error::BatchError;

/// Runs the fetch on the blocking pool, resolves the real output file and
/// records the terminal state in the store. Fetch failures (including an
/// engine panic) become `Error` results; only an unlistable destination
/// directory escapes as `BatchError`.
pub(super) async fn run_one_job(
    job: JobSpec,
    engine: Arc<dyn FetchEngine>,
    store: ProgressStore,
) -> Result<JobResult, BatchError> {
    store.update(job.index, JobState::Starting, 0.0, "starting");
    tracing::debug!(job = %job.index, url = %job.url, "job admitted");

    let fetched = {
        let job = job.clone();
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            let mut sink = JobProgress::new(store, job.index);
            engine.fetch(&job, &mut sink)
        })
        .await
    };

    let outcome = match fetched {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::warn!(job = %job.index, url = %job.url, "fetch failed: {}", e);
            return Ok(finish(&store, JobResult::error(job.index, &job.url, e.to_string())));
        }
        Err(e) => {
            tracing::warn!(job = %job.index, url = %job.url, "fetch worker panicked: {}", e);
            let message = format!("fetch worker failed: {e}");
            return Ok(finish(&store, JobResult::error(job.index, &job.url, message)));
        }
    };

    let resolved = match resolve_output(&job.destination, &outcome.predicted_path, job.kind) {
        Ok(resolved) => resolved,
        Err(source) => {
            let err = BatchError::Destination {
                path: job.destination.clone(),
                source,
            };
            store.update(job.index, JobState::Error, 0.0, err.to_string());
            return Err(err);
        }
    };

    let result = match resolved {
        Some(path) => {
            tracing::info!(job = %job.index, title = %outcome.title, path = %path.display(), "job finished");
            JobResult::success(job.index, &job.url, &outcome.title, path)
        }
        None => {
            let message = format!(
                "engine reported success but no {} file matching '{}' was found in {}",
                job.kind,
                outcome.predicted_path.display(),
                job.destination.display()
            );
            tracing::warn!(job = %job.index, "{}", message);
            JobResult::warning(
                job.index,
                &job.url,
                &outcome.title,
                job.kind,
                Some(outcome.predicted_path),
                message,
            )
        }
    };
    Ok(finish(&store, result))
}

/// Writes the terminal status for `result` and hands the result back.
pub(super) fn finish(store: &ProgressStore, result: JobResult) -> JobResult {
    let percent = match result.state {
        ResultState::Success | ResultState::Warning => 100.0,
        ResultState::Error => store.get(result.index).map(|s| s.percent).unwrap_or(0.0),
    };
    store.update(result.index, result.state.job_state(), percent, result.message.clone());
    result
}
