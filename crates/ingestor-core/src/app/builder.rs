//! ConsumerLoopBuilder - ConsumerLoop の構築とワイヤリング
//!
//! # 設計原則
//! - queue と repository は必須。未設定なら build() が BuildError を返す（Fail-fast）
//! - clock / decider は省略可能（SystemClock / DefaultDecider）
//! - batch_size は起動時に 1..=10 を検証

use std::sync::Arc;
use std::time::Duration;

use crate::config::{IngestConfig, MAX_BATCH_SIZE};
use crate::domain::{Decider, DefaultDecider, RetryPolicy};
use crate::pipeline::MessageTransformer;
use crate::ports::{Clock, DeliveryQueue, LoginRepository, SystemClock};

use super::consumer_loop::{ConsumerLoop, LoopSettings};

/// ConsumerLoopBuilder は ConsumerLoop を構築
///
/// # 使用例
/// ```ignore
/// let consumer = ConsumerLoopBuilder::new()
///     .queue(queue)
///     .repository(repository)
///     .batch_size(10)
///     .build()?;
/// ```
pub struct ConsumerLoopBuilder {
    queue: Option<Arc<dyn DeliveryQueue>>,
    repository: Option<Arc<dyn LoginRepository>>,
    clock: Option<Arc<dyn Clock>>,
    decider: Option<Arc<dyn Decider>>,
    retry_policy: RetryPolicy,
    settings: LoopSettings,
}

/// BuildError は ConsumerLoop 構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("delivery queue is not configured")]
    MissingQueue,

    #[error("login repository is not configured")]
    MissingRepository,

    #[error("batch size must be between 1 and {MAX_BATCH_SIZE}, got {0}")]
    InvalidBatchSize(usize),
}

impl ConsumerLoopBuilder {
    pub fn new() -> Self {
        Self {
            queue: None,
            repository: None,
            clock: None,
            decider: None,
            retry_policy: RetryPolicy::default(),
            settings: LoopSettings::default(),
        }
    }

    /// Timing and retry ceiling from configuration. Queue and repository
    /// still have to be supplied.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new()
            .batch_size(config.batch_size)
            .wait_time(config.wait_time())
            .poll_interval(config.poll_interval())
            .retry_policy(RetryPolicy::new(config.max_receive_count))
    }

    pub fn queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn repository(mut self, repository: Arc<dyn LoginRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the default decider; [`Self::retry_policy`] is then ignored.
    pub fn decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = Some(decider);
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.settings.batch_size = batch_size;
        self
    }

    pub fn wait_time(mut self, wait_time: Duration) -> Self {
        self.settings.wait_time = wait_time;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.settings.poll_interval = poll_interval;
        self
    }

    pub fn build(self) -> Result<ConsumerLoop, BuildError> {
        let queue = self.queue.ok_or(BuildError::MissingQueue)?;
        let repository = self.repository.ok_or(BuildError::MissingRepository)?;
        if self.settings.batch_size == 0 || self.settings.batch_size > MAX_BATCH_SIZE {
            return Err(BuildError::InvalidBatchSize(self.settings.batch_size));
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let decider = self
            .decider
            .unwrap_or_else(|| Arc::new(DefaultDecider::new(self.retry_policy)));

        Ok(ConsumerLoop {
            queue,
            repository,
            transformer: MessageTransformer::new(clock),
            decider,
            settings: self.settings,
        })
    }
}

impl Default for ConsumerLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryDeliveryQueue, InMemoryLoginRepository};
    use rstest::rstest;

    fn complete() -> ConsumerLoopBuilder {
        ConsumerLoopBuilder::new()
            .queue(Arc::new(InMemoryDeliveryQueue::new()))
            .repository(Arc::new(InMemoryLoginRepository::new()))
    }

    #[test]
    fn test_build_success_with_defaults() {
        let consumer = complete().build().unwrap();
        assert_eq!(consumer.settings(), &LoopSettings::default());
    }

    #[test]
    fn test_build_missing_queue() {
        let result = ConsumerLoopBuilder::new()
            .repository(Arc::new(InMemoryLoginRepository::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingQueue)));
    }

    #[test]
    fn test_build_missing_repository() {
        let result = ConsumerLoopBuilder::new()
            .queue(Arc::new(InMemoryDeliveryQueue::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingRepository)));
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    fn test_build_rejects_batch_size(#[case] size: usize) {
        let result = complete().batch_size(size).build();
        assert!(matches!(result, Err(BuildError::InvalidBatchSize(s)) if s == size));
    }

    #[test]
    fn test_from_config_copies_timing() {
        let config = IngestConfig {
            batch_size: 4,
            wait_time_secs: 2,
            poll_interval_ms: 250,
            ..IngestConfig::default()
        };
        let consumer = ConsumerLoopBuilder::from_config(&config)
            .queue(Arc::new(InMemoryDeliveryQueue::new()))
            .repository(Arc::new(InMemoryLoginRepository::new()))
            .build()
            .unwrap();
        assert_eq!(
            consumer.settings(),
            &LoopSettings {
                batch_size: 4,
                wait_time: Duration::from_secs(2),
                poll_interval: Duration::from_millis(250),
            }
        );
    }
}
