//! InMemoryLoginRepository - テスト・デモ用の永続化先
//!
//! 障害注入（次の N 件を失敗させる / 特定 user_id を常に失敗させる）に対応し、
//! ConsumerLoop のリトライ経路をデータベースなしで検証できるようにします。

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::LoginRecord;
use crate::ports::{LoginRepository, PersistenceError};

#[derive(Debug, Default)]
struct State {
    rows: Vec<LoginRecord>,
    fail_next: u32,
    failing_users: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryLoginRepository {
    state: Mutex<State>,
}

impl InMemoryLoginRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` persists fail with `PersistenceError::Unavailable`.
    pub async fn fail_next(&self, n: u32) {
        self.state.lock().await.fail_next = n;
    }

    /// Make every persist for `user_id` fail until cleared.
    pub async fn fail_for_user(&self, user_id: impl Into<String>) {
        self.state.lock().await.failing_users.insert(user_id.into());
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.fail_next = 0;
        state.failing_users.clear();
    }

    /// Snapshot of every committed row, in insert order.
    pub async fn records(&self) -> Vec<LoginRecord> {
        self.state.lock().await.rows.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.rows.is_empty()
    }
}

#[async_trait]
impl LoginRepository for InMemoryLoginRepository {
    async fn persist(&self, record: &LoginRecord) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().await;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(PersistenceError::Unavailable(
                "injected failure".to_string(),
            ));
        }
        if state.failing_users.contains(&record.user_id) {
            return Err(PersistenceError::Unavailable(format!(
                "injected failure for user {}",
                record.user_id
            )));
        }
        state.rows.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(user_id: &str) -> LoginRecord {
        LoginRecord {
            user_id: user_id.to_string(),
            device_type: "android".to_string(),
            masked_ip: "ip".to_string(),
            masked_device_id: "dev".to_string(),
            locale: "ja-JP".to_string(),
            app_version: 100,
            create_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn duplicates_are_kept() {
        let repo = InMemoryLoginRepository::new();
        repo.persist(&record("u1")).await.unwrap();
        repo.persist(&record("u1")).await.unwrap();
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn fail_next_counts_down() {
        let repo = InMemoryLoginRepository::new();
        repo.fail_next(2).await;

        assert!(repo.persist(&record("u1")).await.is_err());
        assert!(repo.persist(&record("u1")).await.is_err());
        assert!(repo.persist(&record("u1")).await.is_ok());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn fail_for_user_is_selective() {
        let repo = InMemoryLoginRepository::new();
        repo.fail_for_user("bad").await;

        assert!(repo.persist(&record("bad")).await.is_err());
        assert!(repo.persist(&record("good")).await.is_ok());

        repo.clear_failures().await;
        assert!(repo.persist(&record("bad")).await.is_ok());
        assert_eq!(repo.len().await, 2);
    }
}
