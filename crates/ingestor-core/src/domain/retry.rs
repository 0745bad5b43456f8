//! Retry policy: decides between redelivery and quarantine.

use super::message::DeliveryAttempt;

/// Retry policy for messages whose processing failed.
///
/// There is no local backoff: a message that should be retried is simply
/// not deleted, and the queue's visibility timeout schedules the next try.
/// The only judgment left here is when to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Quarantine once the queue has delivered the message this many times.
    pub max_receive_count: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 5;

    pub fn new(max_receive_count: u32) -> Self {
        Self { max_receive_count }
    }

    /// Should a failing delivery be force-deleted instead of left for
    /// redelivery? Pure; the caller performs the deletion.
    pub fn should_quarantine(&self, attempt: &DeliveryAttempt) -> bool {
        attempt.approximate_receive_count >= self.max_receive_count
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RECEIVE_COUNT)
    }
}
