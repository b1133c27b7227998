//! Message queue abstraction
//!
//! The queue service is at-least-once: a received message stays hidden for
//! its visibility timeout and reappears unless it is deleted by receipt.

mod memory;
mod sqs;

pub use memory::InMemoryQueueService;
pub use sqs::{SqsOptions, SqsQueueService};

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Largest batch a single receive may request
pub const MAX_RECEIVE_BATCH: usize = 10;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to resolve queue '{queue}': {reason}")]
    Resolve { queue: String, reason: String },

    #[error("receive from '{queue}' failed: {reason}")]
    Receive { queue: String, reason: String },

    #[error("delete from '{queue}' failed: {reason}")]
    Delete { queue: String, reason: String },
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// Reference to one source queue, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueHandle {
    pub name: String,
    /// Service-specific address (the queue URL for SQS)
    pub url: String,
}

impl fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A received message and the receipt needed to delete it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: String,
    pub body: String,
    pub receipt: String,
}

/// One unit of work: a message paired with the queue it came from
#[derive(Debug, Clone)]
pub struct Job {
    pub message: RawMessage,
    pub queue: QueueHandle,
}

/// Queue service consumed by the collector and workers
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Look up a queue by name
    async fn resolve(&self, name: &str) -> Result<QueueHandle>;

    /// Receive up to `max` messages, hiding them for `visibility`
    async fn receive(
        &self,
        queue: &QueueHandle,
        max: usize,
        visibility: Duration,
    ) -> Result<Vec<RawMessage>>;

    /// Delete a previously received message
    async fn delete(&self, queue: &QueueHandle, receipt: &str) -> Result<()>;
}
