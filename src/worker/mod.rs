//! Resize worker pool
//!
//! A [`Dispatcher`] owns a fixed set of [`Worker`]s, each running in its own
//! tokio task and draining a private bounded inbox. Jobs are handed out
//! round-robin by a single producer.

mod dispatcher;
pub mod runner;
#[allow(clippy::module_inception)]
mod worker;

pub use dispatcher::Dispatcher;
pub use runner::{AckStatus, Executor, JobError, JobOutcome, Processor};
pub use worker::{Worker, WorkerReport, WorkerState};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pending jobs a worker may buffer before `assign` waits
pub const DEFAULT_INBOX_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("worker pool size must be greater than zero")]
    EmptyPool,

    #[error("worker {0} already started")]
    AlreadyStarted(usize),

    #[error("worker {0} inbox is closed")]
    WorkerClosed(usize),

    #[error("worker {id} terminated abnormally: {reason}")]
    WorkerPanicked { id: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// When a processed message is deleted from its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
    /// Delete after every attempt, successful or not
    #[default]
    Always,
    /// Delete only on success; failures reappear after the visibility timeout
    OnSuccess,
}

impl AckPolicy {
    pub fn should_delete(&self, succeeded: bool) -> bool {
        match self {
            AckPolicy::Always => true,
            AckPolicy::OnSuccess => succeeded,
        }
    }
}
