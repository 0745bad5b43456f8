//! Queue-side identifiers and delivery metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability to delete one specific delivery of a message.
///
/// Opaque: a new handle is minted on every receive, and only the latest one
/// is guaranteed to work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Queue-assigned message identifier, used for logging only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only delivery metadata supplied by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub receipt_handle: ReceiptHandle,
    pub message_id: MessageId,
    /// How many times the queue has handed this message out, this delivery
    /// included (1 on first receive).
    pub approximate_receive_count: u32,
}

/// One message as returned by `DeliveryQueue::receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub body: String,
    pub attempt: DeliveryAttempt,
}

impl ReceivedMessage {
    pub fn message_id(&self) -> &MessageId {
        &self.attempt.message_id
    }

    pub fn receipt_handle(&self) -> &ReceiptHandle {
        &self.attempt.receipt_handle
    }

    pub fn receive_count(&self) -> u32 {
        self.attempt.approximate_receive_count
    }
}
