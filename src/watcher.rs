//! Queue-watching mode
//!
//! Wires the collector to the worker pool: every job the collector emits is
//! handed to the dispatcher until shutdown is requested. On shutdown the
//! collector finishes its current poll cycle, the remaining stream is
//! dispatched, and then each worker completes its in-flight job.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::collector::{Collector, PollSettings};
use crate::config::{Config, ConfigError, QueueBackend, StorageBackend, ValidationError};
use crate::observability::{Metrics, MetricsSnapshot};
use crate::queue::{InMemoryQueueService, QueueError, QueueService, SqsQueueService};
use crate::storage::{ObjectStorage, StorageClient};
use crate::worker::{AckPolicy, DispatchError, Dispatcher, Executor, Processor, WorkerReport};

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type Result<T> = std::result::Result<T, WatcherError>;

/// Pool and polling parameters for one watcher run
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub queues: Vec<String>,
    pub poll: PollSettings,
    pub workers: usize,
    pub inbox_capacity: usize,
    pub ack_policy: AckPolicy,
}

impl From<&Config> for WatcherOptions {
    fn from(config: &Config) -> Self {
        Self {
            queues: config.queue.names.clone(),
            poll: config.poll_settings(),
            workers: config.worker.count,
            inbox_capacity: config.worker.inbox_capacity,
            ack_policy: config.worker.ack_policy,
        }
    }
}

/// What a finished run did
#[derive(Debug)]
pub struct WatcherSummary {
    pub workers: Vec<WorkerReport>,
    pub metrics: MetricsSnapshot,
}

/// Build the object store selected by `storage.backend`
pub fn build_storage(config: &Config) -> std::result::Result<Arc<dyn ObjectStorage>, ConfigError> {
    let storage: Arc<dyn ObjectStorage> = match config.storage.backend {
        StorageBackend::S3 => {
            let options = config
                .s3_options()
                .ok_or(ValidationError::MissingAws("credentials"))?;
            info!(region = %options.region, "Using S3 storage");
            Arc::new(StorageClient::s3(options))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(StorageClient::in_memory())
        }
    };
    Ok(storage)
}

/// Build the queue service selected by `queue.backend`
pub async fn build_queue(config: &Config) -> std::result::Result<Arc<dyn QueueService>, ConfigError> {
    let queue: Arc<dyn QueueService> = match config.queue.backend {
        QueueBackend::Sqs => {
            let options = config
                .sqs_options()
                .ok_or(ValidationError::MissingAws("credentials"))?;
            info!(region = %options.region, "Using SQS queues");
            Arc::new(SqsQueueService::connect(options).await)
        }
        QueueBackend::Memory => {
            let service = InMemoryQueueService::new();
            for name in &config.queue.names {
                service.create_queue(name).await;
            }
            info!("Using in-memory queues");
            Arc::new(service)
        }
    };
    Ok(queue)
}

/// Load backends from `config` and watch until `shutdown` fires
pub async fn run(config: &Config, shutdown: CancellationToken) -> Result<WatcherSummary> {
    config.validate_watcher()?;
    let storage = build_storage(config)?;
    let queue = build_queue(config).await?;
    run_with(queue, storage, WatcherOptions::from(config), shutdown).await
}

/// Watch queues on the given backends until `shutdown` fires
pub async fn run_with(
    queue: Arc<dyn QueueService>,
    storage: Arc<dyn ObjectStorage>,
    options: WatcherOptions,
    shutdown: CancellationToken,
) -> Result<WatcherSummary> {
    let metrics = Arc::new(Metrics::new());
    let processor = Processor::new(storage, metrics.clone());
    let executor = Arc::new(Executor::new(processor, queue.clone(), options.ack_policy));

    // Resolve queues before any worker exists; failure is fatal
    let collector = Collector::connect(queue, &options.queues, options.poll).await?;

    let mut dispatcher = Dispatcher::new(options.workers, options.inbox_capacity, executor)?;
    dispatcher.start()?;
    info!(
        workers = options.workers,
        ack_policy = ?options.ack_policy,
        "Watching queues"
    );

    let (mut jobs, collector_task) = collector.spawn(shutdown);

    let mut dispatch_error = None;
    while let Some(job) = jobs.recv().await {
        if let Err(e) = dispatcher.assign(job).await {
            error!(error = %e, "Dispatch failed, stopping");
            dispatch_error = Some(e);
            break;
        }
    }
    // Closing the stream stops the collector if dispatch broke off early
    drop(jobs);

    if let Err(e) = collector_task.await {
        error!(error = %e, "Collector task terminated abnormally");
    }

    let workers = dispatcher.stop().await?;
    if let Some(e) = dispatch_error {
        return Err(e.into());
    }

    let metrics = metrics.snapshot();
    info!(
        received = metrics.jobs_received,
        succeeded = metrics.jobs_succeeded,
        failed = metrics.jobs_failed,
        decode_failures = metrics.decode_failures,
        deleted = metrics.messages_deleted,
        delete_failures = metrics.delete_failures,
        "Watcher stopped"
    );

    Ok(WatcherSummary { workers, metrics })
}
