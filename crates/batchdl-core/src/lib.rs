pub mod config;
pub mod logging;

pub mod aggregate;
pub mod control;
pub mod engine;
pub mod history;
pub mod job;
pub mod naming;
pub mod progress;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod validate;
