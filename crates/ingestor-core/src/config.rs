//! IngestConfig - 環境変数からの設定読み込み（`INGESTOR_` プレフィックス）

use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound of one receive call, as with SQS.
pub const MAX_BATCH_SIZE: usize = 10;
/// SQS long-poll limit.
pub const MAX_WAIT_TIME_SECS: u64 = 20;
/// SQS visibility timeout limit (12 hours).
pub const MAX_VISIBILITY_TIMEOUT_SECS: u64 = 43_200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Store
    /// PostgreSQL URL; without it logins go to an in-memory store
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default = "default_table_name")]
    pub table_name: String,

    // Queue
    #[serde(default = "default_queue_backend")]
    pub queue_backend: QueueBackend,

    #[serde(default = "default_queue_table")]
    pub queue_table: String,

    /// Messages per receive call (1..=10)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Long-poll wait per receive call
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,

    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    /// Pause between batches
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delivery-count ceiling before a failing message is quarantined
    #[serde(default = "default_max_receive_count")]
    pub max_receive_count: u32,

    /// Wait before the first receive, for dependencies to come up
    #[serde(default)]
    pub startup_delay_secs: u64,

    /// Enables the demo producer (memory queue only)
    #[serde(default)]
    pub demo_interval_ms: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_db_acquire_timeout_secs() -> u64 {
    5
}

fn default_table_name() -> String {
    "user_logins".to_string()
}

fn default_queue_backend() -> QueueBackend {
    QueueBackend::Memory
}

fn default_queue_table() -> String {
    "login_queue".to_string()
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_wait_time_secs() -> u64 {
    20
}

fn default_visibility_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_receive_count() -> u32 {
    5
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            database_url: None,
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            table_name: default_table_name(),
            queue_backend: default_queue_backend(),
            queue_table: default_queue_table(),
            batch_size: default_batch_size(),
            wait_time_secs: default_wait_time_secs(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_receive_count: default_max_receive_count(),
            startup_delay_secs: 0,
            demo_interval_ms: None,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(Environment::with_prefix("INGESTOR").try_parsing(true)),
        )
    }

    /// Deserialize and validate from an arbitrary builder (tests pass overrides).
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Invalid(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.wait_time_secs > MAX_WAIT_TIME_SECS {
            return Err(ConfigError::Invalid(format!(
                "wait_time_secs must be at most {MAX_WAIT_TIME_SECS}, got {}",
                self.wait_time_secs
            )));
        }
        if self.visibility_timeout_secs > MAX_VISIBILITY_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "visibility_timeout_secs must be at most {MAX_VISIBILITY_TIMEOUT_SECS}, got {}",
                self.visibility_timeout_secs
            )));
        }
        if self.max_receive_count == 0 {
            return Err(ConfigError::Invalid(
                "max_receive_count must be at least 1".to_string(),
            ));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "db_max_connections must be at least 1".to_string(),
            ));
        }
        if self.queue_backend == QueueBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::Invalid(
                "queue_backend=postgres requires database_url".to_string(),
            ));
        }
        if self.demo_interval_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "demo_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config = IngestConfig::from_builder(Config::builder()).unwrap();
        assert_eq!(config, IngestConfig::default());
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.wait_time(), Duration::from_secs(20));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.max_receive_count, 5);
        assert_eq!(config.queue_backend, QueueBackend::Memory);
    }

    #[test]
    fn overrides_are_applied() {
        let builder = Config::builder()
            .set_override("batch_size", 3)
            .unwrap()
            .set_override("queue_backend", "postgres")
            .unwrap()
            .set_override("database_url", "postgres://localhost/ingestor")
            .unwrap()
            .set_override("demo_interval_ms", 250)
            .unwrap();

        let config = IngestConfig::from_builder(builder).unwrap();
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.queue_backend, QueueBackend::Postgres);
        assert_eq!(config.demo_interval_ms, Some(250));
    }

    #[test]
    fn batch_size_out_of_range_is_rejected() {
        for size in [0, 11] {
            let config = IngestConfig {
                batch_size: size,
                ..IngestConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn queue_timings_above_sqs_limits_are_rejected() {
        let wait = IngestConfig {
            wait_time_secs: MAX_WAIT_TIME_SECS + 1,
            ..IngestConfig::default()
        };
        assert!(wait.validate().unwrap_err().to_string().contains("wait_time_secs"));

        let visibility = IngestConfig {
            visibility_timeout_secs: u64::MAX,
            ..IngestConfig::default()
        };
        assert!(visibility
            .validate()
            .unwrap_err()
            .to_string()
            .contains("visibility_timeout_secs"));

        let at_limits = IngestConfig {
            wait_time_secs: MAX_WAIT_TIME_SECS,
            visibility_timeout_secs: MAX_VISIBILITY_TIMEOUT_SECS,
            ..IngestConfig::default()
        };
        assert!(at_limits.validate().is_ok());
    }

    #[test]
    fn postgres_queue_requires_database_url() {
        let config = IngestConfig {
            queue_backend: QueueBackend::Postgres,
            ..IngestConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database_url"));
    }

    #[test]
    fn zero_receive_ceiling_is_rejected() {
        let config = IngestConfig {
            max_receive_count: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
