//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（メッセージキュー、PostgreSQL）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod delivery_queue;
pub mod login_repository;
pub mod clock;

// 主要な trait を再エクスポート
pub use self::delivery_queue::{DeliveryQueue, QueueError};
pub use self::login_repository::{LoginRepository, PersistenceError};
pub use self::clock::{Clock, FixedClock, SystemClock};
