//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryDeliveryQueue**: 開発・テスト用の配送キュー
//! - **InMemoryLoginRepository**: 障害注入つきの永続化先（テスト・デモ用）
//! - **PostgresLoginRepository**: 本番用の永続化先（sqlx）
//! - **PostgresDeliveryQueue**: テーブルベースの配送キュー（sqlx）

pub mod inmem_delivery;
pub mod inmem_repository;
pub mod pg;
pub mod pg_repository;
pub mod pg_delivery;

// 主要な型を再エクスポート
pub use self::inmem_delivery::InMemoryDeliveryQueue;
pub use self::inmem_repository::InMemoryLoginRepository;
pub use self::pg::{create_pool, ping, InvalidIdentifier};
pub use sqlx::postgres::PgPool;
pub use self::pg_repository::PostgresLoginRepository;
pub use self::pg_delivery::PostgresDeliveryQueue;

use std::time::Duration;
use tokio::time::Instant;

// tokio::time::sleep と同じく、表現できない期限は「十分先」に丸める
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + after`, saturating to a far-future instant instead of overflowing.
pub(crate) fn deadline_after(now: Instant, after: Duration) -> Instant {
    now.checked_add(after)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
