use std::sync::Arc;
use tracing::{debug, error, info};

use super::runner::Executor;
use super::worker::{Worker, WorkerReport};
use super::{DispatchError, Result};
use crate::queue::Job;

/// Dispatcher distributes jobs across a fixed worker pool
///
/// Assignment is round-robin, not load-aware: a slow worker builds up a
/// backlog in its own inbox while others idle. When the target inbox is
/// full, [`Dispatcher::assign`] waits, which in turn stalls the caller.
///
/// `assign` takes `&mut self`, so exactly one producer can drive the
/// cursor. Wrap the dispatcher in a mutex if that ever changes.
pub struct Dispatcher {
    workers: Vec<Worker>,
    cursor: usize,
}

impl Dispatcher {
    /// Create `size` idle workers with ids `0..size`
    pub fn new(size: usize, inbox_capacity: usize, executor: Arc<Executor>) -> Result<Self> {
        if size == 0 {
            return Err(DispatchError::EmptyPool);
        }

        info!(size, inbox_capacity, "Creating worker pool");

        let workers = (0..size)
            .map(|id| Worker::new(id, inbox_capacity, executor.clone()))
            .collect();

        Ok(Self { workers, cursor: 0 })
    }

    /// Start every worker loop
    pub fn start(&mut self) -> Result<()> {
        for worker in &mut self.workers {
            worker.start()?;
        }
        Ok(())
    }

    /// Hand `job` to the worker at the cursor, then advance the cursor.
    ///
    /// Returns the index of the worker that received the job.
    pub async fn assign(&mut self, job: Job) -> Result<usize> {
        let index = self.cursor;
        self.workers[index].assign(job).await?;
        self.cursor = (index + 1) % self.workers.len();

        debug!(worker = index, "Job assigned");
        Ok(index)
    }

    /// Index of the worker that will receive the next job
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Signal every worker, then wait for all of them to finish.
    ///
    /// Each worker completes its in-flight job first. Jobs still buffered
    /// are dropped unprocessed. Every worker is joined even if one of them
    /// panicked; the first such failure is returned afterwards.
    pub async fn stop(mut self) -> Result<Vec<WorkerReport>> {
        info!(size = self.workers.len(), "Stopping worker pool");

        for worker in &mut self.workers {
            worker.request_stop();
        }

        let mut reports = Vec::with_capacity(self.workers.len());
        let mut failure = None;
        for worker in self.workers {
            match worker.join().await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(error = %e, "Worker did not stop cleanly");
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        info!("Worker pool stopped");
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Metrics;
    use crate::queue::{InMemoryQueueService, QueueHandle, RawMessage};
    use crate::storage::StorageClient;
    use crate::worker::{AckPolicy, Processor};

    fn executor() -> Arc<Executor> {
        let processor = Processor::new(Arc::new(StorageClient::in_memory()), Arc::new(Metrics::new()));
        Arc::new(Executor::new(
            processor,
            Arc::new(InMemoryQueueService::new()),
            AckPolicy::Always,
        ))
    }

    fn job(n: usize) -> Job {
        Job {
            message: RawMessage {
                id: format!("m{n}"),
                body: "{}".to_string(),
                receipt: format!("r{n}"),
            },
            queue: QueueHandle {
                name: "q".to_string(),
                url: "memory://q".to_string(),
            },
        }
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(
            Dispatcher::new(0, 10, executor()),
            Err(DispatchError::EmptyPool)
        ));
    }

    #[tokio::test]
    async fn test_round_robin_fairness() {
        let mut dispatcher = Dispatcher::new(4, 10, executor()).unwrap();

        for expected in 0..4 {
            assert_eq!(dispatcher.cursor(), expected);
            let index = dispatcher.assign(job(expected)).await.unwrap();
            assert_eq!(index, expected);
        }

        // wrapped back to the first worker
        assert_eq!(dispatcher.cursor(), 0);
        for worker in dispatcher.workers() {
            assert_eq!(worker.pending_jobs(), 1);
        }
    }

    #[tokio::test]
    async fn test_round_robin_distribution() {
        let mut dispatcher = Dispatcher::new(3, 10, executor()).unwrap();

        let assigned: Vec<usize> = {
            let mut v = Vec::new();
            for n in 0..7 {
                v.push(dispatcher.assign(job(n)).await.unwrap());
            }
            v
        };

        assert_eq!(assigned, vec![0, 1, 2, 0, 1, 2, 0]);
        let pending: Vec<usize> = dispatcher.workers().iter().map(Worker::pending_jobs).collect();
        assert_eq!(pending, vec![3, 2, 2]);
    }

    #[tokio::test]
    async fn test_start_and_stop_idle_pool() {
        let mut dispatcher = Dispatcher::new(3, 10, executor()).unwrap();
        dispatcher.start().unwrap();

        let reports = dispatcher.stop().await.unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(reports.iter().all(|r| r.processed == 0));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut dispatcher = Dispatcher::new(2, 10, executor()).unwrap();
        dispatcher.start().unwrap();
        assert!(matches!(dispatcher.start(), Err(DispatchError::AlreadyStarted(0))));
        dispatcher.stop().await.unwrap();
    }
}
