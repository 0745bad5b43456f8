//! MessageTransformer - 検証済みペイロードを LoginRecord に変換する
//!
//! # 手順（順序固定）
//! 1. ip / device_id をマスク
//! 2. 生の ip / device_id を作業用レコードから除去（Repository には渡さない）
//! 3. app_version を正規化（"." を除去して整数化）
//! 4. create_date を Clock から付与
//!
//! タイムスタンプの読み出し以外は純粋関数（I/O なし）。

use std::sync::Arc;

use serde_json::{Map, Value};

use super::hasher::mask;
use crate::domain::{LoginRecord, TransformError, ValidatedEvent};
use crate::ports::Clock;

pub struct MessageTransformer {
    clock: Arc<dyn Clock>,
}

impl MessageTransformer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn transform(&self, event: ValidatedEvent) -> Result<LoginRecord, TransformError> {
        let mut fields = event.into_fields();

        let masked_ip = mask(&take_string(&mut fields, "ip")?);
        let masked_device_id = mask(&take_string(&mut fields, "device_id")?);

        let app_version = normalize_app_version(&take_string(&mut fields, "app_version")?)?;

        Ok(LoginRecord {
            user_id: take_string(&mut fields, "user_id")?,
            device_type: take_string(&mut fields, "device_type")?,
            masked_ip,
            masked_device_id,
            locale: take_string(&mut fields, "locale")?,
            app_version,
            create_date: self.clock.today(),
        })
    }
}

/// Strip every `.` and parse what is left as an integer.
///
/// `"1.2.3"` -> `123`, `"10.0"` -> `100`, `"2.10.1"` -> `2101`.
pub fn normalize_app_version(version: &str) -> Result<i32, TransformError> {
    let digits: String = version.trim().chars().filter(|c| *c != '.').collect();
    digits
        .parse::<i32>()
        .map_err(|_| TransformError::MalformedVersion {
            value: version.to_string(),
        })
}

// Removes the key so the clear-text value does not outlive this function.
fn take_string(
    fields: &mut Map<String, Value>,
    key: &'static str,
) -> Result<String, TransformError> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(TransformError::InvalidField {
            key,
            expected: "string",
        }),
    }
}
