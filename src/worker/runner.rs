//! Per-job pipeline: decode, fetch, resize, store, acknowledge

use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};

use super::AckPolicy;
use crate::job::{DecodeError, Operation};
use crate::observability::Metrics;
use crate::queue::{Job, QueueService};
use crate::storage::{ObjectStorage, StorageError};
use crate::transform::{self, OUTPUT_CONTENT_TYPE, TransformError};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("fetch failed: {0}")]
    Fetch(#[source] StorageError),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("transform task aborted: {0}")]
    TransformAborted(String),

    #[error("store failed: {0}")]
    Store(#[source] StorageError),
}

impl JobError {
    /// Pipeline phase the error came from
    pub fn phase(&self) -> &'static str {
        match self {
            JobError::Decode(_) => "decode",
            JobError::Fetch(_) => "fetch",
            JobError::Transform(_) | JobError::TransformAborted(_) => "transform",
            JobError::Store(_) => "store",
        }
    }
}

pub type Result<T> = std::result::Result<T, JobError>;

/// What happened to the originating message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Deleted,
    DeleteFailed,
    /// Left on the queue for redelivery
    Retained,
}

/// Result of one [`Executor::execute`] call
#[derive(Debug)]
pub struct JobOutcome {
    pub message_id: String,
    pub operation: Option<Operation>,
    pub result: Result<()>,
    pub ack: AckStatus,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs a decoded operation against the object store.
///
/// Shared by queue workers and the synchronous HTTP entry point.
#[derive(Clone)]
pub struct Processor {
    storage: Arc<dyn ObjectStorage>,
    metrics: Arc<Metrics>,
}

impl Processor {
    pub fn new(storage: Arc<dyn ObjectStorage>, metrics: Arc<Metrics>) -> Self {
        Self { storage, metrics }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Fetch, resize and store, then log one completion line.
    ///
    /// Callers attach their identity (worker id, HTTP) through the span.
    pub async fn process(&self, op: &Operation) -> Result<()> {
        let result = self.run(op).await;

        match &result {
            Ok(()) => {
                self.metrics.job_succeeded();
                info!(
                    from = %op.from,
                    to = %op.to,
                    width = op.width,
                    height = op.height,
                    method = %op.method,
                    outcome = "success",
                    "Job completed"
                );
            }
            Err(e) => {
                self.metrics.job_failed();
                error!(
                    from = %op.from,
                    to = %op.to,
                    width = op.width,
                    height = op.height,
                    method = %op.method,
                    outcome = "failure",
                    phase = e.phase(),
                    error = %e,
                    "Job failed"
                );
            }
        }

        result
    }

    async fn run(&self, op: &Operation) -> Result<()> {
        let source = self.storage.get(&op.from).await.map_err(JobError::Fetch)?;

        let (width, height, method) = (op.width, op.height, op.method);
        let output = tokio::task::spawn_blocking(move || {
            transform::resize(&source, width, height, method)
        })
        .await
        .map_err(|e| JobError::TransformAborted(e.to_string()))??;

        self.storage
            .put(&op.to, Bytes::from(output), OUTPUT_CONTENT_TYPE)
            .await
            .map_err(JobError::Store)
    }
}

/// Executes queue jobs and acknowledges their messages
#[derive(Clone)]
pub struct Executor {
    processor: Processor,
    queue: Arc<dyn QueueService>,
    ack_policy: AckPolicy,
}

impl Executor {
    pub fn new(processor: Processor, queue: Arc<dyn QueueService>, ack_policy: AckPolicy) -> Self {
        Self {
            processor,
            queue,
            ack_policy,
        }
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Run one job to completion. Never fails; the outcome is reported.
    ///
    /// An undecodable payload is not deleted. Otherwise the message is
    /// deleted according to the ack policy, after the attempt finishes.
    pub async fn execute(&self, worker_id: usize, job: Job) -> JobOutcome {
        let Job { message, queue } = job;
        let metrics = self.processor.metrics();
        metrics.job_received();

        let operation = match Operation::decode_str(&message.body) {
            Ok(op) => op,
            Err(e) => {
                metrics.decode_failed();
                warn!(
                    worker = worker_id,
                    queue = %queue,
                    message_id = %message.id,
                    error = %e,
                    "Undecodable job left for redelivery"
                );
                return JobOutcome {
                    message_id: message.id,
                    operation: None,
                    result: Err(e.into()),
                    ack: AckStatus::Retained,
                };
            }
        };

        let result = self
            .processor
            .process(&operation)
            .instrument(info_span!("job", worker = worker_id, message_id = %message.id))
            .await;

        let ack = if self.ack_policy.should_delete(result.is_ok()) {
            match self.queue.delete(&queue, &message.receipt).await {
                Ok(()) => {
                    metrics.message_deleted();
                    info!(worker = worker_id, queue = %queue, message_id = %message.id, "Deleted message");
                    AckStatus::Deleted
                }
                Err(e) => {
                    metrics.delete_failed();
                    warn!(worker = worker_id, queue = %queue, message_id = %message.id, error = %e, "Failed to delete message");
                    AckStatus::DeleteFailed
                }
            }
        } else {
            info!(worker = worker_id, queue = %queue, message_id = %message.id, "Failed job left for redelivery");
            AckStatus::Retained
        };

        JobOutcome {
            message_id: message.id,
            operation: Some(operation),
            result,
            ack,
        }
    }
}
