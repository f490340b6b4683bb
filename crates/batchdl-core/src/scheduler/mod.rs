//! Job scheduler.
//!
//! Runs a batch of job specs with a hard cap on concurrently executing
//! fetches: queue → admission (abort/deadline) → worker (fetch on the
//! blocking pool, output resolution) → one terminal result per job.

mod error;
mod execute;
mod parallel;

pub use error::BatchError;
pub use parallel::JobScheduler;
