//! Errors - エラー型と分類
//!
//! メッセージ単位のエラーはすべて ConsumerLoop の境界で捕捉され、
//! 3 つの配送結果（Acknowledge / Quarantine / LeaveForRedelivery）のどれかに変換されます。

use thiserror::Error;

use super::message::ReceiptHandle;

/// ErrorKind は実行エラーの分類
///
/// - Transient: 一時的なエラー（接続断など、再配送で直る見込みが高い）
/// - Permanent: データ起因のエラー（再配送でも直らない可能性が高い）
/// - Infrastructure: 分類できなかったストア側のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// Structural defect in a payload. A routing result, not a fault: the
/// message is quarantined immediately because redelivery cannot add a
/// missing field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invalid {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing keys in message: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// A validated payload holds a value that cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("malformed app_version {value:?}: not an integer once dots are removed")]
    MalformedVersion { value: String },

    #[error("field {key} must be a {expected}")]
    InvalidField {
        key: &'static str,
        expected: &'static str,
    },
}

/// The store rejected or could not take the insert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("persistence failed: {0}")]
    Other(String),
}

/// Failure talking to the queue. Logged by the loop, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("receipt handle {0} is unknown or stale")]
    InvalidReceipt(ReceiptHandle),
}

/// Failures that take the retry branch: counted against the delivery ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("malformed message body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::MalformedBody(_)
            | ProcessingError::Transform(_)
            | ProcessingError::Persistence(PersistenceError::Constraint(_)) => ErrorKind::Permanent,
            ProcessingError::Persistence(PersistenceError::Unavailable(_)) => ErrorKind::Transient,
            ProcessingError::Persistence(PersistenceError::Other(_)) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_message_lists_keys() {
        let err = Invalid::MissingKeys(vec!["ip".to_string(), "locale".to_string()]);
        assert_eq!(err.to_string(), "missing keys in message: ip, locale");
    }

    #[test]
    fn processing_error_kinds() {
        let malformed = ProcessingError::MalformedBody("eof".into());
        assert_eq!(malformed.kind(), ErrorKind::Permanent);

        let down = ProcessingError::from(PersistenceError::Unavailable("refused".into()));
        assert_eq!(down.kind(), ErrorKind::Transient);

        let too_long = ProcessingError::from(PersistenceError::Constraint("22001".into()));
        assert_eq!(too_long.kind(), ErrorKind::Permanent);

        let other = ProcessingError::from(PersistenceError::Other("protocol".into()));
        assert_eq!(other.kind(), ErrorKind::Infrastructure);
    }
}
