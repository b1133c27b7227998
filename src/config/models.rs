use crate::humanize::{ByteSize, HumanDuration};
use crate::queue::MAX_RECEIVE_BATCH;
use crate::worker::{AckPolicy, DEFAULT_INBOX_CAPACITY};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// AWS credentials and region.
///
/// Keys missing from the file are filled from `AWS_ACCESS_KEY_ID`,
/// `AWS_SECRET_ACCESS_KEY` (or `AWS_SECRET_KEY`) and `AWS_REGION`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AwsConfig {
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint, e.g. LocalStack
    pub endpoint: Option<String>,
}

/// Queue service backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    #[default]
    Sqs,
    Memory,
}

/// Queue polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub backend: QueueBackend,
    /// Names of the queues to poll
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default = "default_polling")]
    pub polling: HumanDuration,
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout: HumanDuration,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            names: Vec::new(),
            polling: default_polling(),
            visibility_timeout: default_visibility_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_polling() -> HumanDuration {
    HumanDuration::from_secs(1)
}

fn default_visibility_timeout() -> HumanDuration {
    HumanDuration::from_secs(120)
}

fn default_batch_size() -> usize {
    MAX_RECEIVE_BATCH
}

/// Object store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_count")]
    pub count: usize,
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
    #[serde(default)]
    pub ack_policy: AckPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            inbox_capacity: default_inbox_capacity(),
            ack_policy: AckPolicy::default(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_inbox_capacity() -> usize {
    DEFAULT_INBOX_CAPACITY
}

/// HTTP entry point configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_max_payload_bytes() -> ByteSize {
    ByteSize(1024 * 1024) // 1 MB
}
