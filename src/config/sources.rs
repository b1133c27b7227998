use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "RESIZER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "setting.json";
const ENV_PREFIX: &str = "RESIZER";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. Settings file (if exists; JSON or TOML by extension)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = explicit_path
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Fill AWS credentials and region the settings file left out
fn load_secrets(config: &mut Config) {
    let aws = &mut config.aws;

    if aws.access_key.is_none() {
        aws.access_key = env::var("AWS_ACCESS_KEY_ID").ok();
    }
    if aws.secret_key.is_none() {
        aws.secret_key = env::var("AWS_SECRET_ACCESS_KEY")
            .or_else(|_| env::var("AWS_SECRET_KEY"))
            .ok();
    }
    if aws.region.is_none() {
        aws.region = env::var("AWS_REGION").ok();
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "{}: not found, using defaults and environment overrides",
            config_path.display()
        );
    }

    // RESIZER__QUEUE__NAMES=a,b -> queue.names
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("queue.names"),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueBackend;
    use crate::worker::AckPolicy;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.json");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.worker.count, 4);
    }

    #[test]
    fn test_load_from_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("setting.json");

        let json = r#"{
            "aws": { "access_key": "AKIA", "secret_key": "shh", "region": "ap-northeast-1" },
            "queue": { "names": ["resize-high", "resize-low"], "polling": "2s", "visibility_timeout": "20s" },
            "worker": { "count": 8, "ack_policy": "on_success" },
            "server": { "port": 9000 }
        }"#;
        fs::write(&config_path, json).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.aws.region.as_deref(), Some("ap-northeast-1"));
        assert_eq!(config.queue.names, vec!["resize-high", "resize-low"]);
        assert_eq!(config.queue.polling.as_duration(), Duration::from_secs(2));
        assert_eq!(config.queue.visibility_timeout.as_duration(), Duration::from_secs(20));
        assert_eq!(config.worker.count, 8);
        assert_eq!(config.worker.ack_policy, AckPolicy::OnSuccess);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("resizer.toml");

        let toml_content = r#"
[queue]
backend = "memory"
names = ["local"]
polling = "250ms"

[storage]
backend = "memory"

[server]
max_payload_bytes = "2MB"
        "#;
        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.queue.backend, QueueBackend::Memory);
        assert_eq!(config.queue.polling.as_duration(), Duration::from_millis(250));
        assert_eq!(config.server.max_payload_bytes.as_u64(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("setting.json");
        fs::write(&config_path, r#"{"worker": {"count": "many"}}"#).unwrap();

        assert!(load_from_sources(config_path).is_err());
    }

    // Environment overrides are not covered here: env::set_var is unsafe
    // under edition 2024 and races with parallel tests.
}
