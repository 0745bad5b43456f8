//! PostgresDeliveryQueue - テーブルベースの配送キュー
//!
//! SQS と同じ契約（visibility timeout / 受信回数 / receipt handle）を 1 テーブルで再現します。
//! テーブルの作成（プロビジョニング）は範囲外。想定スキーマ:
//!
//! ```sql
//! CREATE TABLE login_queue (
//!     message_id     TEXT PRIMARY KEY,
//!     body           TEXT NOT NULL,
//!     receive_count  INTEGER NOT NULL DEFAULT 0,
//!     visible_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
//!     receipt_handle TEXT
//! );
//! ```

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tokio::time::Instant;
use super::deadline_after;
use super::pg::{quote_identifier, InvalidIdentifier};
use crate::domain::{DeliveryAttempt, MessageId, ReceiptHandle, ReceivedMessage};
use crate::ports::{DeliveryQueue, QueueError};

#[derive(Debug, sqlx::FromRow)]
struct ClaimedRow {
    message_id: String,
    body: String,
    receive_count: i32,
    receipt_handle: String,
}

impl From<ClaimedRow> for ReceivedMessage {
    fn from(row: ClaimedRow) -> Self {
        ReceivedMessage {
            body: row.body,
            attempt: DeliveryAttempt {
                receipt_handle: ReceiptHandle::new(row.receipt_handle),
                message_id: MessageId::new(row.message_id),
                approximate_receive_count: u32::try_from(row.receive_count).unwrap_or(0),
            },
        }
    }
}

/// PostgresDeliveryQueue は `FOR UPDATE SKIP LOCKED` で可視行を claim する
///
/// # 設計原則
/// - claim と同時に receive_count を増やし、visible_at を timeout 分先送りし、receipt handle を発行し直す
/// - 複数の consumer が同じ行を同時に claim しない（SKIP LOCKED）
/// - long-poll は POLL_STEP 間隔の再試行で近似する
/// - receive は cancel safe ではない: claim の UPDATE が commit された後に future を
///   drop すると、処理されないまま receive_count だけが進む
#[derive(Clone)]
pub struct PostgresDeliveryQueue {
    pool: PgPool,
    claim_sql: String,
    delete_sql: String,
    visibility_timeout: Duration,
}

impl PostgresDeliveryQueue {
    pub const DEFAULT_TABLE: &'static str = "login_queue";
    const POLL_STEP: Duration = Duration::from_millis(500);

    pub fn new(
        pool: PgPool,
        table: &str,
        visibility_timeout: Duration,
    ) -> Result<Self, InvalidIdentifier> {
        let table = quote_identifier(table)?;
        let claim_sql = format!(
            "UPDATE {table} SET \
                 receive_count = receive_count + 1, \
                 visible_at = now() + make_interval(secs => $2), \
                 receipt_handle = gen_random_uuid()::text \
             WHERE message_id IN ( \
                 SELECT message_id FROM {table} \
                 WHERE visible_at <= now() \
                 ORDER BY visible_at \
                 LIMIT $1 \
                 FOR UPDATE SKIP LOCKED) \
             RETURNING message_id, body, receive_count, receipt_handle"
        );
        let delete_sql = format!("DELETE FROM {table} WHERE receipt_handle = $1");
        Ok(Self {
            pool,
            claim_sql,
            delete_sql,
            visibility_timeout,
        })
    }

    async fn claim(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>, QueueError> {
        let limit = i64::try_from(max_messages).unwrap_or(i64::MAX);
        let rows: Vec<ClaimedRow> = sqlx::query_as(&self.claim_sql)
            .bind(limit)
            .bind(self.visibility_timeout.as_secs_f64())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| QueueError::ReceiveFailed(e.to_string()))?;
        Ok(rows.into_iter().map(ReceivedMessage::from).collect())
    }
}

#[async_trait]
impl DeliveryQueue for PostgresDeliveryQueue {
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
            let batch = self.claim(max_messages).await?;
            let now = Instant::now();
            if !batch.is_empty() || now >= deadline {
                return Ok(batch);
            }
            let remaining = deadline.saturating_duration_since(now);
            tokio::time::sleep(remaining.min(Self::POLL_STEP)).await;
        }
    }

    async fn delete(&self, receipt_handle: &ReceiptHandle) -> Result<(), QueueError> {
        let result = sqlx::query(&self.delete_sql)
            .bind(receipt_handle.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| QueueError::DeleteFailed(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(QueueError::InvalidReceipt(receipt_handle.clone()));
        }
        Ok(())
    }

    fn cancel_safe_receive(&self) -> bool {
        false
    }
}
