use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::runner::Executor;
use super::{DispatchError, Result};
use crate::queue::Job;

/// Lifecycle as seen by the worker's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
}

/// Summary returned once a worker has terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    /// Jobs executed to completion
    pub processed: usize,
    /// Jobs still buffered when the worker stopped
    pub dropped: usize,
}

/// Channel ends held until the worker is started
struct Pending {
    inbox: mpsc::Receiver<Job>,
    stop: oneshot::Receiver<()>,
}

/// A single sequential job executor bound to one tokio task
pub struct Worker {
    id: usize,
    sender: mpsc::Sender<Job>,
    executor: Arc<Executor>,
    pending: Option<Pending>,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<WorkerReport>>,
    state: WorkerState,
}

impl Worker {
    pub fn new(id: usize, capacity: usize, executor: Arc<Executor>) -> Self {
        let (sender, inbox) = mpsc::channel(capacity);
        let (stop_tx, stop_rx) = oneshot::channel();

        Self {
            id,
            sender,
            executor,
            pending: Some(Pending {
                inbox,
                stop: stop_rx,
            }),
            stop: Some(stop_tx),
            handle: None,
            state: WorkerState::Idle,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Jobs queued in the inbox and not yet picked up
    pub fn pending_jobs(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Spawn the execution loop
    pub fn start(&mut self) -> Result<()> {
        let Pending { mut inbox, mut stop } =
            self.pending.take().ok_or(DispatchError::AlreadyStarted(self.id))?;
        let id = self.id;
        let executor = self.executor.clone();

        self.handle = Some(tokio::spawn(async move {
            info!(worker = id, "Worker started");
            let mut processed = 0;

            loop {
                // Stop is only observed here, between jobs
                tokio::select! {
                    biased;
                    _ = &mut stop => break,
                    job = inbox.recv() => match job {
                        Some(job) => {
                            executor.execute(id, job).await;
                            processed += 1;
                        }
                        None => break,
                    },
                }
            }

            let dropped = inbox.len();
            if dropped > 0 {
                warn!(worker = id, dropped, "Worker stopped with unprocessed jobs");
            }
            info!(worker = id, processed, "Worker finished");

            WorkerReport { id, processed, dropped }
        }));
        self.state = WorkerState::Running;
        Ok(())
    }

    /// Queue a job, waiting while the inbox is full
    pub async fn assign(&self, job: Job) -> Result<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| DispatchError::WorkerClosed(self.id))
    }

    /// Ask the loop to exit after its current job
    pub fn request_stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            // the loop may already be gone if its inbox closed
            let _ = stop.send(());
        }
        if self.state == WorkerState::Running {
            self.state = WorkerState::Stopping;
        }
    }

    /// Wait for the loop to acknowledge termination
    pub async fn join(mut self) -> Result<WorkerReport> {
        match self.handle.take() {
            Some(handle) => handle.await.map_err(|e| DispatchError::WorkerPanicked {
                id: self.id,
                reason: e.to_string(),
            }),
            None => Ok(WorkerReport {
                id: self.id,
                processed: 0,
                dropped: self.pending.as_ref().map_or(0, |p| p.inbox.len()),
            }),
        }
    }

    /// Request stop and wait for it
    pub async fn stop(mut self) -> Result<WorkerReport> {
        self.request_stop();
        self.join().await
    }
}
