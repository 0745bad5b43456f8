//! InMemoryDeliveryQueue - 開発用の配送キュー（SQS 風）
//!
//! # 学習ポイント
//! - tokio::sync::Mutex + Notify による long-poll receive
//! - visibility timeout による暗黙のリトライ
//! - 受信ごとに receipt handle を発行し直す（古い handle では delete できない）

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use ulid::Ulid;

use super::deadline_after;
use crate::domain::{DeliveryAttempt, MessageId, ReceiptHandle, ReceivedMessage};
use crate::ports::{DeliveryQueue, QueueError};

#[derive(Debug)]
struct StoredMessage {
    message_id: MessageId,
    body: String,
    receive_count: u32,
    /// Hidden from receivers until this instant.
    visible_at: Instant,
    /// Handle of the latest delivery, if any.
    receipt_handle: Option<ReceiptHandle>,
}

/// InMemoryDeliveryQueue は開発・テスト用の配送キュー
///
/// # 実装詳細
/// - VecDeque<StoredMessage> を tokio の Mutex で保護（ロックを跨いだ await はしない）
/// - send 時に Notify で待機中の receive を起こす
/// - 受信したメッセージは visibility timeout の間だけ不可視
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryDeliveryQueue::new();
/// queue.send(r#"{"user_id":"u1"}"#).await;
/// let batch = queue.receive(10, Duration::from_secs(20)).await?;
/// ```
pub struct InMemoryDeliveryQueue {
    messages: Arc<Mutex<VecDeque<StoredMessage>>>,
    notify: Arc<Notify>,
    visibility_timeout: Duration,
}

impl InMemoryDeliveryQueue {
    pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        Self::with_visibility_timeout(Self::DEFAULT_VISIBILITY_TIMEOUT)
    }

    pub fn with_visibility_timeout(visibility_timeout: Duration) -> Self {
        Self {
            messages: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            visibility_timeout,
        }
    }

    /// Enqueue a message body; it is visible immediately.
    pub async fn send(&self, body: impl Into<String>) -> MessageId {
        let message_id = MessageId::new(Ulid::new().to_string());
        {
            let mut messages = self.messages.lock().await;
            messages.push_back(StoredMessage {
                message_id: message_id.clone(),
                body: body.into(),
                receive_count: 0,
                visible_at: Instant::now(),
                receipt_handle: None,
            });
        }
        self.notify.notify_one();
        message_id
    }

    /// Messages not yet deleted, in flight or not.
    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }

    /// Received but neither deleted nor visible again yet.
    pub async fn in_flight(&self) -> usize {
        let now = Instant::now();
        self.messages
            .lock()
            .await
            .iter()
            .filter(|m| m.visible_at > now)
            .count()
    }

    fn claim(
        messages: &mut VecDeque<StoredMessage>,
        max_messages: usize,
        now: Instant,
        visibility_timeout: Duration,
    ) -> Vec<ReceivedMessage> {
        messages
            .iter_mut()
            .filter(|m| m.visible_at <= now)
            .take(max_messages)
            .map(|m| {
                m.receive_count += 1;
                m.visible_at = deadline_after(now, visibility_timeout);
                let receipt_handle = ReceiptHandle::new(Ulid::new().to_string());
                m.receipt_handle = Some(receipt_handle.clone());
                ReceivedMessage {
                    body: m.body.clone(),
                    attempt: DeliveryAttempt {
                        receipt_handle,
                        message_id: m.message_id.clone(),
                        approximate_receive_count: m.receive_count,
                    },
                }
            })
            .collect()
    }
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    /// 可視メッセージを最大 max_messages 件受信する
    ///
    /// # 実装
    /// 1. Mutex をロックして可視メッセージを claim
    /// 2. 1 件以上あれば即座に返す
    /// 3. なければ send の通知・次の可視化時刻・wait の期限のいずれかまで待つ
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }

        let deadline = deadline_after(Instant::now(), wait);
        loop {
            let next_visible = {
                let mut messages = self.messages.lock().await;
                let now = Instant::now();
                let batch =
                    Self::claim(&mut messages, max_messages, now, self.visibility_timeout);
                if !batch.is_empty() || now >= deadline {
                    return Ok(batch);
                }
                messages
                    .iter()
                    .map(|m| m.visible_at)
                    .filter(|at| *at > now)
                    .min()
            };

            let wake_at = next_visible.map_or(deadline, |at| at.min(deadline));
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<(), QueueError> {
        let mut messages = self.messages.lock().await;
        let position = messages
            .iter()
            .position(|m| m.receipt_handle.as_ref() == Some(receipt_handle))
            .ok_or_else(|| QueueError::InvalidReceipt(receipt_handle.clone()))?;
        messages.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_receive_roundtrip() {
        let queue = InMemoryDeliveryQueue::new();
        let id = queue.send("hello").await;

        let batch = queue.receive(10, Duration::from_secs(1)).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, "hello");
        assert_eq!(batch[0].message_id(), &id);
        assert_eq!(batch[0].receive_count(), 1);
    }

    #[tokio::test]
    async fn test_receive_timeout_on_empty_queue() {
        let queue = InMemoryDeliveryQueue::new();
        let start = Instant::now();
        let batch = queue
            .receive(10, Duration::from_millis(300))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_receive_respects_max_messages() {
        let queue = InMemoryDeliveryQueue::new();
        for i in 0..5 {
            queue.send(format!("m{i}")).await;
        }

        let batch = queue.receive(3, Duration::ZERO).await.unwrap();
        assert_eq!(batch.len(), 3);
        let rest = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn test_received_message_is_hidden_until_timeout() {
        let queue = InMemoryDeliveryQueue::with_visibility_timeout(Duration::from_millis(200));
        queue.send("m").await;

        let first = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(queue.in_flight().await, 1);

        let hidden = queue.receive(10, Duration::ZERO).await.unwrap();
        assert!(hidden.is_empty());

        // long-poll は再可視化まで待つ
        let again = queue.receive(10, Duration::from_secs(2)).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].receive_count(), 2);
        assert_ne!(again[0].receipt_handle(), first[0].receipt_handle());
    }

    #[tokio::test]
    async fn test_delete_removes_message() {
        let queue = InMemoryDeliveryQueue::with_visibility_timeout(Duration::ZERO);
        queue.send("m").await;

        let batch = queue.receive(10, Duration::ZERO).await.unwrap();
        queue.delete(batch[0].receipt_handle()).await.unwrap();

        assert!(queue.is_empty().await);
        assert!(queue.receive(10, Duration::ZERO).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_receipt_handle_is_rejected() {
        let queue = InMemoryDeliveryQueue::with_visibility_timeout(Duration::ZERO);
        queue.send("m").await;

        let first = queue.receive(10, Duration::ZERO).await.unwrap();
        let _second = queue.receive(10, Duration::ZERO).await.unwrap();

        let err = queue.delete(first[0].receipt_handle()).await.unwrap_err();
        assert_eq!(
            err,
            QueueError::InvalidReceipt(first[0].receipt_handle().clone())
        );
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_send_wakes_receive() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());

        let receive_future = tokio::spawn({
            let queue = queue.clone();
            async move { queue.receive(10, Duration::from_secs(5)).await.unwrap() }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        queue.send("late").await;

        let batch = receive_future.await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, "late");
    }

    #[tokio::test]
    async fn test_unbounded_visibility_timeout_hides_message() {
        let queue = InMemoryDeliveryQueue::with_visibility_timeout(Duration::MAX);
        queue.send("m").await;

        let first = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(queue.receive(10, Duration::ZERO).await.unwrap().is_empty());
        assert_eq!(queue.in_flight().await, 1);
    }

    #[tokio::test]
    async fn test_unbounded_wait_returns_visible_message() {
        let queue = InMemoryDeliveryQueue::new();
        queue.send("m").await;

        let batch = tokio::time::timeout(
            Duration::from_secs(1),
            queue.receive(10, Duration::MAX),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(batch.len(), 1);
    }
}
