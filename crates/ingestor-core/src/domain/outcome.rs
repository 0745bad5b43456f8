//! Outcome model: what happened to one delivery.
//!
//! Every message ends its processing attempt in exactly one of these
//! outcomes. The queue action follows from the outcome:
//! - `Acknowledged`: persisted, then deleted.
//! - `Quarantined`: deleted without persisting.
//! - `LeftForRedelivery`: nothing; the visibility timeout brings it back.

use serde::{Deserialize, Serialize};

use super::errors::Invalid;

/// Why a message was dropped without being persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuarantineReason {
    /// Structural defect, quarantined on first sight.
    Invalid(Invalid),

    /// Processing kept failing and the delivery count hit the ceiling.
    RetriesExhausted { receive_count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Acknowledged,
    Quarantined { reason: QuarantineReason },
    LeftForRedelivery,
}

impl DeliveryOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            DeliveryOutcome::Acknowledged => OutcomeKind::Acknowledged,
            DeliveryOutcome::Quarantined { .. } => OutcomeKind::Quarantined,
            DeliveryOutcome::LeftForRedelivery => OutcomeKind::LeftForRedelivery,
        }
    }

    /// Does settling this outcome delete the message from the queue?
    pub fn deletes_message(&self) -> bool {
        !matches!(self, DeliveryOutcome::LeftForRedelivery)
    }
}

/// Flat classification of an outcome, for logs and summaries.
///
/// We serialize as SCREAMING_SNAKE_CASE so log pipelines can match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Acknowledged,
    Quarantined,
    LeftForRedelivery,
}
