//! Queue collector
//!
//! Polls every configured queue on a fixed interval and turns received
//! messages into a single stream of [`Job`]s. Messages keep their batch
//! order; nothing is promised across queues or ticks.
//!
//! The collector never deletes messages. That is left to the worker that
//! processes each job.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::queue::{Job, QueueHandle, QueueService, Result, MAX_RECEIVE_BATCH};

/// Output stream capacity. Kept at one so a stalled dispatcher stops polling.
const STREAM_CAPACITY: usize = 1;

/// Polling parameters
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub visibility_timeout: Duration,
    pub batch_size: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            visibility_timeout: Duration::from_secs(120),
            batch_size: MAX_RECEIVE_BATCH,
        }
    }
}

pub struct Collector {
    service: Arc<dyn QueueService>,
    queues: Vec<QueueHandle>,
    settings: PollSettings,
}

impl Collector {
    /// Resolve every queue name up front. Any failure is fatal.
    pub async fn connect(
        service: Arc<dyn QueueService>,
        names: &[String],
        settings: PollSettings,
    ) -> Result<Self> {
        let mut queues = Vec::with_capacity(names.len());
        for name in names {
            let handle = service.resolve(name).await?;
            debug!(queue = %handle.name, url = %handle.url, "Resolved queue");
            queues.push(handle);
        }

        info!(queues = queues.len(), interval = ?settings.interval, "Collector ready");

        Ok(Self {
            service,
            queues,
            settings,
        })
    }

    pub fn queues(&self) -> &[QueueHandle] {
        &self.queues
    }

    /// Start polling in a background task.
    ///
    /// The returned stream closes once `shutdown` fires and the poll cycle in
    /// progress at that moment has been fully emitted.
    pub fn spawn(self, shutdown: CancellationToken) -> (mpsc::Receiver<Job>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        let handle = tokio::spawn(self.run(tx, shutdown));
        (rx, handle)
    }

    async fn run(self, tx: mpsc::Sender<Job>, shutdown: CancellationToken) {
        let period = self.settings.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, collector stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.poll_once(&tx).await {
                        warn!("Job stream receiver dropped, collector stopping");
                        break;
                    }
                }
            }
        }
        // tx drops here, closing the stream
    }

    /// One pass over every queue. Returns false if the receiver is gone.
    async fn poll_once(&self, tx: &mpsc::Sender<Job>) -> bool {
        for queue in &self.queues {
            let messages = match self
                .service
                .receive(queue, self.settings.batch_size, self.settings.visibility_timeout)
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(queue = %queue.name, error = %e, "Poll failed, skipping queue");
                    continue;
                }
            };

            if !messages.is_empty() {
                info!(queue = %queue.name, count = messages.len(), "Received messages");
            }

            for message in messages {
                let job = Job {
                    message,
                    queue: queue.clone(),
                };
                if tx.send(job).await.is_err() {
                    return false;
                }
            }
        }
        true
    }
}
