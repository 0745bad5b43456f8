//! LoginRepository port - 永続化先（append-only の sink）

use async_trait::async_trait;

use crate::domain::LoginRecord;

pub use crate::domain::PersistenceError;

/// LoginRepository は LoginRecord を 1 行として挿入する
///
/// # 設計原則
/// - 1 回の persist = 1 トランザクション（commit してから返す）
/// - upsert / 重複排除はしない（再配送による重複行は許容）
/// - エラーは握りつぶさずに呼び出し側へ返す
#[async_trait]
pub trait LoginRepository: Send + Sync {
    async fn persist(&self, record: &LoginRecord) -> Result<(), PersistenceError>;
}
