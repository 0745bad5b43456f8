//! ConsumerLoop - 受信→検証→変換→永続化→確認応答のループ
//!
//! # メッセージごとの状態遷移
//! - Received → {Valid, Invalid}
//! - Valid → {Persisted, Failed}
//! - 終端アクション: Acknowledge（削除）/ Quarantine（永続化せず削除）/ LeaveForRedelivery（何もしない）
//!
//! # フロー（バッチごと）
//! 1. DeliveryQueue::receive() で最大 batch_size 件を long-poll
//! 2. 各メッセージ: parse → validate → transform → persist
//! 3. 成功なら delete、Invalid なら即 delete、それ以外の失敗は Decider に委ねる
//! 4. 1 件の失敗で残りのメッセージを止めない
//! 5. バッチ後に poll_interval だけ待つ（shutdown と競合させる）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::{
    Decider, Decision, DeliveryOutcome, Invalid, ProcessingError, QuarantineReason, QueueError,
    RawEvent, ReceivedMessage,
};
use crate::observability::BatchSummary;
use crate::pipeline::{validate, MessageTransformer};
use crate::ports::{DeliveryQueue, LoginRepository};

/// Receive/pause timing of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub batch_size: usize,
    /// Long-poll wait per receive call.
    pub wait_time: Duration,
    /// Pause after every batch, empty or not.
    pub poll_interval: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            wait_time: Duration::from_secs(20),
            poll_interval: Duration::from_secs(1),
        }
    }
}

// Why a message did not make it to the store.
enum Rejection {
    Invalid(Invalid),
    Failed(ProcessingError),
}

impl From<ProcessingError> for Rejection {
    fn from(err: ProcessingError) -> Self {
        Rejection::Failed(err)
    }
}

/// Built by [`super::ConsumerLoopBuilder`].
pub struct ConsumerLoop {
    pub(super) queue: Arc<dyn DeliveryQueue>,
    pub(super) repository: Arc<dyn LoginRepository>,
    pub(super) transformer: MessageTransformer,
    pub(super) decider: Arc<dyn Decider>,
    pub(super) settings: LoopSettings,
}

impl ConsumerLoop {
    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Run until shutdown is requested (or the sender is dropped).
    ///
    /// Shutdown is checked between batches: a batch that has been received is
    /// always processed to the end. A pending receive is abandoned on shutdown
    /// only when the queue reports it as cancel safe. Returns the totals of the
    /// whole run.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> BatchSummary {
        let mut totals = BatchSummary::default();
        info!(
            batch_size = self.settings.batch_size,
            wait_time_secs = self.settings.wait_time.as_secs(),
            "consumer loop started"
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let receive = self
                .queue
                .receive(self.settings.batch_size, self.settings.wait_time);
            let received = if self.queue.cancel_safe_receive() {
                // receive は long-poll で待つので shutdown と競合させる
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                    received = receive => received,
                }
            } else {
                // claim 済みのバッチを捨てない: 受信を待ち切って処理してから止まる
                receive.await
            };

            match received {
                Ok(messages) => {
                    let summary = self.process_batch(&messages).await;
                    if !summary.is_empty() {
                        info!(
                            received = summary.received,
                            acknowledged = summary.acknowledged,
                            quarantined = summary.quarantined(),
                            left_for_redelivery = summary.left_for_redelivery,
                            delete_failures = summary.delete_failures,
                            "batch processed"
                        );
                    }
                    totals.merge(&summary);
                }
                Err(err) => {
                    error!(error = %err, "failed to receive messages");
                    totals.receive_failures += 1;
                }
            }

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        info!(
            acknowledged = totals.acknowledged,
            quarantined = totals.quarantined(),
            left_for_redelivery = totals.left_for_redelivery,
            "consumer loop stopped"
        );
        totals
    }

    /// Receive and process a single batch, without the inter-batch pause.
    pub async fn run_once(&self) -> Result<BatchSummary, QueueError> {
        let messages = self
            .queue
            .receive(self.settings.batch_size, self.settings.wait_time)
            .await?;
        Ok(self.process_batch(&messages).await)
    }

    /// Process every message of a batch in order. One message's failure
    /// never stops the ones after it.
    pub async fn process_batch(&self, messages: &[ReceivedMessage]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for message in messages {
            summary.received += 1;
            let outcome = self.process_message(message).await;
            summary.record(&outcome);
            if let Err(err) = self.settle(message, &outcome).await {
                // 削除に失敗したメッセージは再配送される（永続化済みなら重複行になる）
                error!(
                    message_id = %message.message_id(),
                    outcome = ?outcome.kind(),
                    error = %err,
                    "failed to delete message"
                );
                summary.delete_failures += 1;
            }
        }
        summary
    }

    /// Decide the outcome of one delivery. Persists on success but performs no
    /// queue I/O; see [`Self::settle`].
    pub async fn process_message(&self, message: &ReceivedMessage) -> DeliveryOutcome {
        info!(
            message_id = %message.message_id(),
            receive_count = message.receive_count(),
            bytes = message.body.len(),
            "message received"
        );

        match self.ingest(message).await {
            Ok(()) => DeliveryOutcome::Acknowledged,
            Err(Rejection::Invalid(invalid)) => DeliveryOutcome::Quarantined {
                reason: QuarantineReason::Invalid(invalid),
            },
            Err(Rejection::Failed(err)) => {
                warn!(
                    message_id = %message.message_id(),
                    receive_count = message.receive_count(),
                    kind = ?err.kind(),
                    error = %err,
                    "error processing message"
                );
                match self.decider.decide(&message.attempt, &err) {
                    Decision::Quarantine { reason } => {
                        debug!(message_id = %message.message_id(), %reason, "quarantine decided");
                        DeliveryOutcome::Quarantined {
                            reason: QuarantineReason::RetriesExhausted {
                                receive_count: message.receive_count(),
                            },
                        }
                    }
                    Decision::LeaveForRedelivery { reason } => {
                        debug!(message_id = %message.message_id(), %reason, "redelivery decided");
                        DeliveryOutcome::LeftForRedelivery
                    }
                }
            }
        }
    }

    async fn ingest(&self, message: &ReceivedMessage) -> Result<(), Rejection> {
        let raw = RawEvent::parse(&message.body)
            .map_err(|e| ProcessingError::MalformedBody(e.to_string()))?;
        let validated = validate(raw).map_err(Rejection::Invalid)?;
        let record = self
            .transformer
            .transform(validated)
            .map_err(ProcessingError::from)?;
        self.repository
            .persist(&record)
            .await
            .map_err(ProcessingError::from)?;
        Ok(())
    }

    /// Carry out the queue side of an outcome.
    async fn settle(
        &self,
        message: &ReceivedMessage,
        outcome: &DeliveryOutcome,
    ) -> Result<(), QueueError> {
        if outcome.deletes_message() {
            self.queue.delete(message.receipt_handle()).await?;
        }

        let message_id = message.message_id();
        match outcome {
            DeliveryOutcome::Acknowledged => {
                info!(message_id = %message_id, "message acknowledged");
            }
            DeliveryOutcome::Quarantined {
                reason: QuarantineReason::Invalid(invalid),
            } => {
                warn!(message_id = %message_id, reason = %invalid, "rogue message deleted");
            }
            DeliveryOutcome::Quarantined {
                reason: QuarantineReason::RetriesExhausted { receive_count },
            } => {
                warn!(
                    message_id = %message_id,
                    receive_count = *receive_count,
                    "message deleted after retries"
                );
            }
            DeliveryOutcome::LeftForRedelivery => {
                info!(
                    message_id = %message_id,
                    receive_count = message.receive_count(),
                    "message left for redelivery"
                );
            }
        }
        Ok(())
    }
}
