use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::{QueueError, QueueHandle, QueueService, RawMessage, Result};

#[derive(Debug)]
struct Entry {
    id: String,
    body: String,
    receipt: Option<String>,
    hidden_until: Option<Instant>,
}

impl Entry {
    fn visible(&self, now: Instant) -> bool {
        self.hidden_until.is_none_or(|until| until <= now)
    }
}

/// In-process queue service honouring visibility timeouts.
///
/// Queues are created on [`InMemoryQueueService::create_queue`] or on first
/// [`InMemoryQueueService::send`]; resolving an unknown name fails like a
/// missing SQS queue would.
#[derive(Debug, Default)]
pub struct InMemoryQueueService {
    queues: Mutex<HashMap<String, Vec<Entry>>>,
}

impl InMemoryQueueService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_queue(&self, name: &str) {
        self.queues.lock().await.entry(name.to_string()).or_default();
    }

    /// Enqueue a message body, returning its message id
    pub async fn send(&self, name: &str, body: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.queues
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .push(Entry {
                id: id.clone(),
                body: body.into(),
                receipt: None,
                hidden_until: None,
            });
        id
    }

    /// Number of messages not yet deleted, visible or not
    pub async fn len(&self, name: &str) -> usize {
        self.queues.lock().await.get(name).map_or(0, Vec::len)
    }

    pub async fn is_empty(&self, name: &str) -> bool {
        self.len(name).await == 0
    }
}

#[async_trait]
impl QueueService for InMemoryQueueService {
    async fn resolve(&self, name: &str) -> Result<QueueHandle> {
        if self.queues.lock().await.contains_key(name) {
            Ok(QueueHandle {
                name: name.to_string(),
                url: format!("memory://{name}"),
            })
        } else {
            Err(QueueError::Resolve {
                queue: name.to_string(),
                reason: "queue does not exist".to_string(),
            })
        }
    }

    async fn receive(
        &self,
        queue: &QueueHandle,
        max: usize,
        visibility: Duration,
    ) -> Result<Vec<RawMessage>> {
        let mut queues = self.queues.lock().await;
        let entries = queues.get_mut(&queue.name).ok_or_else(|| QueueError::Receive {
            queue: queue.name.clone(),
            reason: "queue does not exist".to_string(),
        })?;

        let now = Instant::now();
        let received: Vec<RawMessage> = entries
            .iter_mut()
            .filter(|entry| entry.visible(now))
            .take(max)
            .map(|entry| {
                let receipt = Uuid::new_v4().to_string();
                entry.receipt = Some(receipt.clone());
                entry.hidden_until = Some(now + visibility);
                RawMessage {
                    id: entry.id.clone(),
                    body: entry.body.clone(),
                    receipt,
                }
            })
            .collect();

        debug!(queue = %queue.name, count = received.len(), "In-memory receive");
        Ok(received)
    }

    async fn delete(&self, queue: &QueueHandle, receipt: &str) -> Result<()> {
        let mut queues = self.queues.lock().await;
        let entries = queues.get_mut(&queue.name).ok_or_else(|| QueueError::Delete {
            queue: queue.name.clone(),
            reason: "queue does not exist".to_string(),
        })?;

        let position = entries
            .iter()
            .position(|entry| entry.receipt.as_deref() == Some(receipt))
            .ok_or_else(|| QueueError::Delete {
                queue: queue.name.clone(),
                reason: "receipt is not current".to_string(),
            })?;

        entries.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VISIBILITY: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_resolve_unknown_queue_fails() {
        let service = InMemoryQueueService::new();
        assert!(matches!(
            service.resolve("missing").await,
            Err(QueueError::Resolve { .. })
        ));
    }

    #[tokio::test]
    async fn test_receive_respects_batch_size_and_order() {
        let service = InMemoryQueueService::new();
        for i in 0..15 {
            service.send("jobs", format!("m{i}")).await;
        }
        let queue = service.resolve("jobs").await.unwrap();

        let first = service.receive(&queue, 10, VISIBILITY).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].body, "m0");
        assert_eq!(first[9].body, "m9");

        // the first ten are hidden now
        let second = service.receive(&queue, 10, VISIBILITY).await.unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].body, "m10");
    }

    #[tokio::test(start_paused = true)]
    async fn test_undeleted_message_reappears_after_visibility_timeout() {
        let service = InMemoryQueueService::new();
        service.send("jobs", "payload").await;
        let queue = service.resolve("jobs").await.unwrap();

        let first = service.receive(&queue, 10, VISIBILITY).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(service.receive(&queue, 10, VISIBILITY).await.unwrap().is_empty());

        tokio::time::advance(VISIBILITY + Duration::from_secs(1)).await;

        let again = service.receive(&queue, 10, VISIBILITY).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id, first[0].id);
        assert_ne!(again[0].receipt, first[0].receipt);
    }

    #[tokio::test]
    async fn test_delete_removes_message() {
        let service = InMemoryQueueService::new();
        service.send("jobs", "payload").await;
        let queue = service.resolve("jobs").await.unwrap();

        let received = service.receive(&queue, 10, VISIBILITY).await.unwrap();
        service.delete(&queue, &received[0].receipt).await.unwrap();

        assert!(service.is_empty("jobs").await);
        assert!(service.delete(&queue, &received[0].receipt).await.is_err());
    }
}
