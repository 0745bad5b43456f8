//! RawEvent / ValidatedEvent - キューから受け取ったままのペイロード
//!
//! RawEvent は型付きスキーマではなく、JSON をそのまま保持します。
//! 必須キーの有無は validator が後から判定します（late binding）。

use serde_json::{Map, Value};

/// Keys every login event must carry.
pub const REQUIRED_KEYS: [&str; 6] = [
    "user_id",
    "device_type",
    "ip",
    "device_id",
    "locale",
    "app_version",
];

/// The payload as received from the queue.
///
/// Lives for one processing attempt only and is never persisted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    value: Value,
}

impl RawEvent {
    /// Parse a message body. Any valid JSON is accepted here; whether it is an
    /// object with the right keys is the validator's call.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let value = serde_json::from_str(body)?;
        Ok(Self { value })
    }

    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn into_value(self) -> Value {
        self.value
    }
}

/// A RawEvent known to contain every key in [`REQUIRED_KEYS`].
///
/// Same representation as the raw payload. Only `pipeline::validator` can
/// construct one, so holding a `ValidatedEvent` is the proof of validity.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    fields: Map<String, Value>,
}

impl ValidatedEvent {
    pub(crate) fn new_unchecked(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_any_json() {
        let event = RawEvent::parse(r#"["not", "an", "object"]"#).unwrap();
        assert!(event.as_value().is_array());
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(RawEvent::parse("{user_id: u1").is_err());
    }
}
