//! Amazon SQS adapter

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::Client;
use aws_sdk_sqs::config::Credentials;
use aws_sdk_sqs::error::DisplayErrorContext;
use std::time::Duration;
use tracing::{info, warn};

use super::{QueueError, QueueHandle, QueueService, RawMessage, Result};

/// Connection settings for SQS
#[derive(Debug, Clone)]
pub struct SqsOptions {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
}

/// Queue service backed by Amazon SQS
#[derive(Debug, Clone)]
pub struct SqsQueueService {
    client: Client,
}

impl SqsQueueService {
    pub async fn connect(options: SqsOptions) -> Self {
        let credentials = Credentials::new(
            options.access_key,
            options.secret_key,
            None,
            None,
            "resizing-worker",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(options.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = options.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        info!(region = %options.region, "SQS client configured");

        Self {
            client: Client::new(&shared),
        }
    }
}

#[async_trait]
impl QueueService for SqsQueueService {
    async fn resolve(&self, name: &str) -> Result<QueueHandle> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| QueueError::Resolve {
                queue: name.to_string(),
                reason: DisplayErrorContext(e).to_string(),
            })?;

        let url = output.queue_url().ok_or_else(|| QueueError::Resolve {
            queue: name.to_string(),
            reason: "response carried no queue URL".to_string(),
        })?;

        Ok(QueueHandle {
            name: name.to_string(),
            url: url.to_string(),
        })
    }

    async fn receive(
        &self,
        queue: &QueueHandle,
        max: usize,
        visibility: Duration,
    ) -> Result<Vec<RawMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&queue.url)
            .max_number_of_messages(max as i32)
            .visibility_timeout(visibility.as_secs() as i32)
            .send()
            .await
            .map_err(|e| QueueError::Receive {
                queue: queue.name.clone(),
                reason: DisplayErrorContext(e).to_string(),
            })?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|m| match m.receipt_handle() {
                Some(receipt) => Some(RawMessage {
                    id: m.message_id().unwrap_or_default().to_string(),
                    body: m.body().unwrap_or_default().to_string(),
                    receipt: receipt.to_string(),
                }),
                None => {
                    warn!(queue = %queue.name, message_id = ?m.message_id(), "Message without receipt handle skipped");
                    None
                }
            })
            .collect();

        Ok(messages)
    }

    async fn delete(&self, queue: &QueueHandle, receipt: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&queue.url)
            .receipt_handle(receipt)
            .send()
            .await
            .map_err(|e| QueueError::Delete {
                queue: queue.name.clone(),
                reason: DisplayErrorContext(e).to_string(),
            })?;
        Ok(())
    }
}
