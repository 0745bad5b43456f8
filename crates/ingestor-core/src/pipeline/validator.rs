//! MessageValidator - 必須キーの有無だけを検査する
//!
//! 型や値の範囲は見ない。キーが欠けていれば `Invalid` を返す（プロセスの障害ではなくルーティング判断）。

use crate::domain::{Invalid, RawEvent, ValidatedEvent, REQUIRED_KEYS};

/// Check that every required key is present.
///
/// A payload that is not a JSON object cannot have the keys and is
/// `Invalid::NotAnObject`. Missing keys are reported in a stable order.
pub fn validate(event: RawEvent) -> Result<ValidatedEvent, Invalid> {
    let serde_json::Value::Object(fields) = event.into_value() else {
        return Err(Invalid::NotAnObject);
    };

    let mut missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !fields.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    if !missing.is_empty() {
        missing.sort();
        return Err(Invalid::MissingKeys(missing));
    }

    Ok(ValidatedEvent::new_unchecked(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn complete() -> serde_json::Value {
        json!({
            "user_id": "u1",
            "device_type": "ios",
            "ip": "1.2.3.4",
            "device_id": "d-9",
            "locale": "en-US",
            "app_version": "3.2.1"
        })
    }

    #[test]
    fn complete_event_is_valid() {
        let validated = validate(RawEvent::from_value(complete())).unwrap();
        for key in REQUIRED_KEYS {
            assert!(validated.contains_key(key));
        }
    }

    #[test]
    fn extra_keys_are_allowed() {
        let mut value = complete();
        value["session"] = json!("abc");
        assert!(validate(RawEvent::from_value(value)).is_ok());
    }

    #[test]
    fn value_types_are_not_checked() {
        let mut value = complete();
        value["app_version"] = json!(null);
        assert!(validate(RawEvent::from_value(value)).is_ok());
    }

    #[rstest]
    #[case::user_id("user_id")]
    #[case::device_type("device_type")]
    #[case::ip("ip")]
    #[case::device_id("device_id")]
    #[case::locale("locale")]
    #[case::app_version("app_version")]
    fn any_missing_key_is_invalid(#[case] key: &str) {
        let mut value = complete();
        value.as_object_mut().unwrap().remove(key);

        let err = validate(RawEvent::from_value(value)).unwrap_err();
        assert_eq!(err, Invalid::MissingKeys(vec![key.to_string()]));
    }

    #[test]
    fn missing_keys_are_sorted() {
        let err = validate(RawEvent::from_value(json!({"user_id": "u1"}))).unwrap_err();
        assert_eq!(
            err,
            Invalid::MissingKeys(vec![
                "app_version".to_string(),
                "device_id".to_string(),
                "device_type".to_string(),
                "ip".to_string(),
                "locale".to_string(),
            ])
        );
    }

    #[rstest]
    #[case::array(json!(["user_id"]))]
    #[case::string(json!("user_id"))]
    #[case::null(json!(null))]
    fn non_object_is_invalid(#[case] value: serde_json::Value) {
        let err = validate(RawEvent::from_value(value)).unwrap_err();
        assert_eq!(err, Invalid::NotAnObject);
    }
}
