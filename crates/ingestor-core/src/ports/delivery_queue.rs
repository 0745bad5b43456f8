//! DeliveryQueue port - 配送キュー（SQS 互換のセマンティクス）
//!
//! キュー本体は外部コラボレータとして扱い、ここでは最小限の操作だけを定義します。
//!
//! # 実装
//! - InMemoryDeliveryQueue（開発・テスト用）
//! - PostgresDeliveryQueue（テーブルベース）

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ReceiptHandle, ReceivedMessage};

pub use crate::domain::QueueError;

/// DeliveryQueue は at-least-once の配送チャネル
///
/// # 設計原則
/// - receive は long-poll（`wait` まで待つ、空なら空の Vec）
/// - 受信したメッセージは visibility timeout の間ほかの受信者から見えない
/// - delete されなかったメッセージは timeout 後に再配送される（暗黙のリトライ）
/// - 順序保証なし（FIFO を前提にしない）
///
/// # Cancel safety
/// receive の future を途中で drop したとき、claim 済みのメッセージが失われない
/// （受信回数も進まない）実装だけが `cancel_safe_receive()` で true を返す。
/// false の実装に対して ConsumerLoop は shutdown で receive を中断しない。
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Receive up to `max_messages`, waiting at most `wait` when none are visible.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Delete the delivery identified by `receipt_handle`.
    async fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<(), QueueError>;

    /// Can an in-flight `receive` be dropped without claiming anything?
    fn cancel_safe_receive(&self) -> bool {
        true
    }
}
