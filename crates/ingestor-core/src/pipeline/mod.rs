//! Pipeline - メッセージ単位の純粋な処理（I/O なし）
//!
//! validate → transform（内部で hasher を使用）

pub mod hasher;
pub mod validator;
pub mod transformer;

pub use self::hasher::mask;
pub use self::validator::validate;
pub use self::transformer::{normalize_app_version, MessageTransformer};
