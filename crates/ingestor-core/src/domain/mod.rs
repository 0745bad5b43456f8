//! Domain model (events, records, deliveries, outcomes, decisions, errors).
//!
//! - raw_event: RawEvent / ValidatedEvent と必須キー
//! - login_record: 永続化されるエンティティ
//! - message: ReceiptHandle, MessageId, DeliveryAttempt
//! - outcome / decision / retry: 配送結果とリトライ判定
//! - errors: エラー分類

pub mod raw_event;
pub mod login_record;
pub mod message;
pub mod outcome;
pub mod retry;
pub mod decision;
pub mod errors;

pub use self::raw_event::{RawEvent, ValidatedEvent, REQUIRED_KEYS};
pub use self::login_record::LoginRecord;
pub use self::message::{DeliveryAttempt, MessageId, ReceiptHandle, ReceivedMessage};
pub use self::outcome::{DeliveryOutcome, OutcomeKind, QuarantineReason};
pub use self::retry::RetryPolicy;
pub use self::decision::{Decider, Decision, DefaultDecider};
pub use self::errors::{
    ErrorKind, Invalid, PersistenceError, ProcessingError, QueueError, TransformError,
};
