//! PostgresLoginRepository - 本番用の永続化先
//!
//! # 設計原則
//! - プール（PgPool）はループ全体で共有し、persist ごとに接続とトランザクションを取得
//! - 1 persist = 1 トランザクション。commit 前にエラーで抜けた場合は drop で rollback
//! - エラーは PersistenceError に分類して呼び出し側に返す

use async_trait::async_trait;
use sqlx::postgres::PgPool;

use super::pg::{classify_error, quote_identifier, InvalidIdentifier};
use crate::domain::LoginRecord;
use crate::ports::{LoginRepository, PersistenceError};

#[derive(Clone)]
pub struct PostgresLoginRepository {
    pool: PgPool,
    insert_sql: String,
}

impl PostgresLoginRepository {
    pub const DEFAULT_TABLE: &'static str = "user_logins";

    pub fn new(pool: PgPool, table: &str) -> Result<Self, InvalidIdentifier> {
        let table = quote_identifier(table)?;
        let insert_sql = format!(
            "INSERT INTO {table} \
             (user_id, device_type, masked_ip, masked_device_id, locale, app_version, create_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
        Ok(Self { pool, insert_sql })
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }
}

#[async_trait]
impl LoginRepository for PostgresLoginRepository {
    async fn persist(&self, record: &LoginRecord) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(classify_error)?;

        sqlx::query(&self.insert_sql)
            .bind(&record.user_id)
            .bind(&record.device_type)
            .bind(&record.masked_ip)
            .bind(&record.masked_device_id)
            .bind(&record.locale)
            .bind(record.app_version)
            .bind(record.create_date)
            .execute(&mut *tx)
            .await
            .map_err(classify_error)?;

        tx.commit().await.map_err(classify_error)?;
        Ok(())
    }
}
