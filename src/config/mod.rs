//! Configuration management for the resizing worker
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. A settings file, JSON or TOML (default `setting.json`)
//! 3. Environment variables (highest priority)
//!
//! AWS credentials and region fall back to the standard `AWS_*` variables
//! when the settings file leaves them out.
//!
//! # Usage
//!
//! ```no_run
//! use resizing_worker::config::Config;
//!
//! let config = Config::load(None).expect("Failed to load configuration");
//! println!("Polling {:?} every {}", config.queue.names, config.queue.polling);
//! ```
//!
//! # Environment Variables
//!
//! Overrides use the pattern `RESIZER__<section>__<key>`:
//! - `RESIZER__WORKER__COUNT=8`
//! - `RESIZER__QUEUE__NAMES=resize-high,resize-low`
//! - `RESIZER__QUEUE__POLLING=500ms`
//!
//! The settings file path can be set with `RESIZER_CONFIG` or `--config`.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{
    AwsConfig, Config, QueueBackend, QueueConfig, ServerConfig, StorageBackend, StorageConfig,
    WorkerConfig,
};
pub use validation::ValidationError;

use crate::collector::PollSettings;
use crate::queue::SqsOptions;
use crate::storage::S3Options;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is malformed or validation
    /// fails (missing AWS credentials, zero workers, ...).
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, ignoring `AWS_*` fallbacks
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Checks that only apply when polling queues
    pub fn validate_watcher(&self) -> Result<(), ConfigError> {
        validation::validate_watcher(self)?;
        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.queue.polling.as_duration(),
            visibility_timeout: self.queue.visibility_timeout.as_duration(),
            batch_size: self.queue.batch_size,
        }
    }

    /// S3 options; `None` unless credentials and region are all present
    pub fn s3_options(&self) -> Option<S3Options> {
        let aws = &self.aws;
        Some(S3Options {
            region: aws.region.clone()?,
            access_key: aws.access_key.clone()?,
            secret_key: aws.secret_key.clone()?,
            endpoint: aws.endpoint.clone(),
        })
    }

    /// SQS options; `None` unless credentials and region are all present
    pub fn sqs_options(&self) -> Option<SqsOptions> {
        let aws = &self.aws;
        Some(SqsOptions {
            region: aws.region.clone()?,
            access_key: aws.access_key.clone()?,
            secret_key: aws.secret_key.clone()?,
            endpoint: aws.endpoint.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_local_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("setting.json");

        let json = r#"{
            "queue": { "backend": "memory", "names": ["local"] },
            "storage": { "backend": "memory" }
        }"#;
        fs::write(&config_path, json).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert!(config.validate_watcher().is_ok());

        let poll = config.poll_settings();
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert_eq!(poll.visibility_timeout, Duration::from_secs(120));
        assert_eq!(poll.batch_size, 10);
    }

    #[test]
    fn test_validation_catches_missing_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("setting.json");
        fs::write(&config_path, r#"{"queue": {"names": ["q"]}}"#).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::MissingAws(_))
        ));
    }

    #[test]
    fn test_aws_options() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("setting.json");
        let json = r#"{
            "aws": { "access_key": "AKIA", "secret_key": "shh", "region": "eu-west-1",
                     "endpoint": "http://localhost:4566" },
            "queue": { "names": ["q"] }
        }"#;
        fs::write(&config_path, json).unwrap();

        let config = Config::load_from_path(config_path).unwrap();

        let s3 = config.s3_options().unwrap();
        assert_eq!(s3.region, "eu-west-1");
        assert_eq!(s3.endpoint.as_deref(), Some("http://localhost:4566"));

        let sqs = config.sqs_options().unwrap();
        assert_eq!(sqs.access_key, "AKIA");
    }

    #[test]
    fn test_watcher_requires_queues() {
        let mut config = Config::default();
        config.queue.backend = QueueBackend::Memory;
        config.storage.backend = StorageBackend::Memory;

        assert!(matches!(
            config.validate_watcher(),
            Err(ConfigError::ValidationError(ValidationError::NoQueuesConfigured))
        ));
    }
}
