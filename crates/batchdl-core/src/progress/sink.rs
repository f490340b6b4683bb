//! Progress sink handed to the fetch engine for one job.

use crate::job::{clamp_percent, JobIndex, JobState};

use super::ProgressStore;

/// Receives progress from the fetch engine while a fetch is in flight.
///
/// `percent` is `None` for phases that carry no numeric progress (e.g. audio
/// extraction after the download).
pub trait ProgressSink: Send {
    fn report(&mut self, percent: Option<f64>, phase: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(Option<f64>, &str) + Send,
{
    fn report(&mut self, percent: Option<f64>, phase: &str) {
        self(percent, phase)
    }
}

/// Sink that writes one job's progress into the store as `Downloading`.
/// Percent never goes backwards: lower reports keep the previous maximum.
#[derive(Debug)]
pub struct JobProgress {
    store: ProgressStore,
    job: JobIndex,
    percent: f64,
}

impl JobProgress {
    pub fn new(store: ProgressStore, job: JobIndex) -> Self {
        Self {
            store,
            job,
            percent: 0.0,
        }
    }

    /// Highest percent reported so far.
    pub fn percent(&self) -> f64 {
        self.percent
    }
}

impl ProgressSink for JobProgress {
    fn report(&mut self, percent: Option<f64>, phase: &str) {
        if let Some(p) = percent {
            let p = clamp_percent(p);
            if p > self.percent {
                self.percent = p;
            }
        }
        self.store
            .update(self.job, JobState::Downloading, self.percent, phase);
    }
}
