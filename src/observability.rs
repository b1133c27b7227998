//! Logging setup and in-process job counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Metrics handle for recording job counters
#[derive(Debug, Default)]
pub struct Metrics {
    jobs_received: AtomicU64,
    jobs_succeeded: AtomicU64,
    jobs_failed: AtomicU64,
    decode_failures: AtomicU64,
    messages_deleted: AtomicU64,
    delete_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_received(&self) {
        self.jobs_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn job_succeeded(&self) {
        self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn job_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_failed", "Metric incremented");
    }

    pub fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "decode_failures", "Metric incremented");
    }

    pub fn message_deleted(&self) {
        self.messages_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delete_failed(&self) {
        self.delete_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "delete_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_received: self.jobs_received.load(Ordering::Relaxed),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            messages_deleted: self.messages_deleted.load(Ordering::Relaxed),
            delete_failures: self.delete_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub jobs_received: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub decode_failures: u64,
    pub messages_deleted: u64,
    pub delete_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = Metrics::new();
        metrics.job_received();
        metrics.job_received();
        metrics.job_succeeded();
        metrics.job_failed();
        metrics.message_deleted();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_received, 2);
        assert_eq!(snapshot.jobs_succeeded, 1);
        assert_eq!(snapshot.jobs_failed, 1);
        assert_eq!(snapshot.messages_deleted, 1);
        assert_eq!(snapshot.delete_failures, 0);
    }
}
