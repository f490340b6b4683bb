//! Batch control: a shared abort token and an optional deadline.
//!
//! Aborting only stops admission of new jobs. A fetch that is already running
//! is an opaque external call and always runs to its own completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Message recorded for jobs that were never admitted.
pub const ABORTED_BEFORE_START: &str = "batch aborted before job started";

/// Shared abort handle for one batch. Clone it into whatever needs to stop
/// the batch (signal handler, UI button, deadline timer).
#[derive(Debug, Clone, Default)]
pub struct BatchControl {
    aborted: Arc<AtomicBool>,
}

impl BatchControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop admitting new jobs. Idempotent.
    pub fn abort(&self) {
        if !self.aborted.swap(true, Ordering::AcqRel) {
            tracing::info!("batch abort requested; no further jobs will start");
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}

/// Admission gate combining the abort token with an optional deadline
/// measured from the start of the run.
#[derive(Debug, Clone)]
pub(crate) struct Admission {
    control: BatchControl,
    deadline: Option<Instant>,
}

impl Admission {
    pub(crate) fn new(control: BatchControl, deadline: Option<Duration>) -> Self {
        Self {
            control,
            deadline: deadline.map(|d| Instant::now() + d),
        }
    }

    /// True if a new job may still start.
    pub(crate) fn open(&self) -> bool {
        if self.control.is_aborted() {
            return false;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                tracing::info!("batch deadline reached; no further jobs will start");
                self.control.abort();
                false
            }
            _ => true,
        }
    }

    pub(crate) fn close(&self) {
        self.control.abort();
    }
}
