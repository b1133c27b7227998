use super::models::{Config, QueueBackend, StorageBackend};
use crate::queue::MAX_RECEIVE_BATCH;
use std::time::Duration;
use thiserror::Error;

/// SQS rejects visibility timeouts above 12 hours
const MAX_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("worker.count must be greater than zero")]
    NoWorkers,

    #[error("worker.inbox_capacity must be greater than zero")]
    ZeroInboxCapacity,

    #[error("queue.batch_size must be between 1 and {max}, got {actual}")]
    InvalidBatchSize { actual: usize, max: usize },

    #[error("queue.polling must be a positive duration")]
    ZeroPollingInterval,

    #[error("queue.visibility_timeout {actual:?} exceeds the {max:?} limit")]
    VisibilityTimeoutTooLong { actual: Duration, max: Duration },

    #[error("no queues configured (queue.names is empty)")]
    NoQueuesConfigured,

    #[error("cannot find aws {0}. please set it in the settings file or in env")]
    MissingAws(&'static str),
}

/// Validate settings shared by every run mode
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_worker(config)?;
    validate_queue(config)?;
    validate_aws(config)?;
    Ok(())
}

/// Extra checks for the queue-watching mode
pub fn validate_watcher(config: &Config) -> Result<(), ValidationError> {
    if config.queue.names.is_empty() {
        return Err(ValidationError::NoQueuesConfigured);
    }
    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    if config.worker.count == 0 {
        return Err(ValidationError::NoWorkers);
    }
    if config.worker.inbox_capacity == 0 {
        return Err(ValidationError::ZeroInboxCapacity);
    }
    Ok(())
}

fn validate_queue(config: &Config) -> Result<(), ValidationError> {
    let queue = &config.queue;

    if queue.batch_size == 0 || queue.batch_size > MAX_RECEIVE_BATCH {
        return Err(ValidationError::InvalidBatchSize {
            actual: queue.batch_size,
            max: MAX_RECEIVE_BATCH,
        });
    }

    if queue.polling.as_duration().is_zero() {
        return Err(ValidationError::ZeroPollingInterval);
    }

    let visibility = queue.visibility_timeout.as_duration();
    if visibility > MAX_VISIBILITY_TIMEOUT {
        return Err(ValidationError::VisibilityTimeoutTooLong {
            actual: visibility,
            max: MAX_VISIBILITY_TIMEOUT,
        });
    }

    Ok(())
}

/// AWS backends need a full set of credentials and a region
fn validate_aws(config: &Config) -> Result<(), ValidationError> {
    let needs_aws =
        config.queue.backend == QueueBackend::Sqs || config.storage.backend == StorageBackend::S3;
    if !needs_aws {
        return Ok(());
    }

    let aws = &config.aws;
    if aws.access_key.as_deref().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingAws("access key"));
    }
    if aws.secret_key.as_deref().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingAws("secret key"));
    }
    if aws.region.as_deref().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingAws("region"));
    }
    Ok(())
}
