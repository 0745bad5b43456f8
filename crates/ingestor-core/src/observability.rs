use serde::{Deserialize, Serialize};

use crate::domain::{DeliveryOutcome, QuarantineReason};

/// Outcome counts for one batch, or accumulated over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub received: usize,
    pub acknowledged: usize,
    pub quarantined_invalid: usize,
    pub quarantined_after_retries: usize,
    pub left_for_redelivery: usize,
    /// Deletes that failed; the message will come back (possibly as a duplicate row).
    pub delete_failures: usize,
    pub receive_failures: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Acknowledged => self.acknowledged += 1,
            DeliveryOutcome::Quarantined {
                reason: QuarantineReason::Invalid(_),
            } => self.quarantined_invalid += 1,
            DeliveryOutcome::Quarantined {
                reason: QuarantineReason::RetriesExhausted { .. },
            } => self.quarantined_after_retries += 1,
            DeliveryOutcome::LeftForRedelivery => self.left_for_redelivery += 1,
        }
    }

    pub fn merge(&mut self, other: &BatchSummary) {
        self.received += other.received;
        self.acknowledged += other.acknowledged;
        self.quarantined_invalid += other.quarantined_invalid;
        self.quarantined_after_retries += other.quarantined_after_retries;
        self.left_for_redelivery += other.left_for_redelivery;
        self.delete_failures += other.delete_failures;
        self.receive_failures += other.receive_failures;
    }

    pub fn quarantined(&self) -> usize {
        self.quarantined_invalid + self.quarantined_after_retries
    }

    pub fn is_empty(&self) -> bool {
        self.received == 0 && self.receive_failures == 0
    }
}
