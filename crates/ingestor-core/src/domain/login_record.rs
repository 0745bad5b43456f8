//! LoginRecord: the persisted entity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the destination table.
///
/// `masked_ip` and `masked_device_id` are SHA-256 digests; the clear-text
/// values are dropped by the transformer and never reach this type.
/// `user_id` is not unique here: redelivery can insert the same login twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoginRecord {
    pub user_id: String,
    pub device_type: String,
    pub masked_ip: String,
    pub masked_device_id: String,
    pub locale: String,
    /// Dotted version with the dots stripped (`"3.2.1"` -> `321`).
    pub app_version: i32,
    pub create_date: NaiveDate,
}
