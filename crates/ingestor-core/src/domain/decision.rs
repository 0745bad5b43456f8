//! Decision model: next action for a delivery whose processing failed.
//!
//! This module defines the Decision type (what to do next) and the Decider trait
//! (how to determine it from the delivery metadata and the failure).

use super::errors::ProcessingError;
use super::message::DeliveryAttempt;
use super::retry::RetryPolicy;

/// The next action to take for a failed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Do nothing; the queue redelivers after the visibility timeout.
    LeaveForRedelivery { reason: String },

    /// Delete the message without persisting it.
    Quarantine { reason: String },
}

/// Trait for deciding the next action after a processing failure.
///
/// Deciders are pure functions: given the delivery metadata and the error,
/// they return the next action without side effects.
pub trait Decider: Send + Sync {
    fn decide(&self, attempt: &DeliveryAttempt, error: &ProcessingError) -> Decision;
}

/// Default decider: delivery-count ceiling from [`RetryPolicy`].
///
/// Every failure class is treated alike; only the count matters.
/// The actual deletion is performed by the consumer loop.
#[derive(Debug, Clone, Default)]
pub struct DefaultDecider {
    retry_policy: RetryPolicy,
}

impl DefaultDecider {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self { retry_policy }
    }
}

impl Decider for DefaultDecider {
    fn decide(&self, attempt: &DeliveryAttempt, error: &ProcessingError) -> Decision {
        let count = attempt.approximate_receive_count;
        let max = self.retry_policy.max_receive_count;
        if self.retry_policy.should_quarantine(attempt) {
            Decision::Quarantine {
                reason: format!("Max receive count reached: {count}/{max} ({error})"),
            }
        } else {
            Decision::LeaveForRedelivery {
                reason: format!("Redelivery {}/{max} after: {error}", count + 1),
            }
        }
    }
}
