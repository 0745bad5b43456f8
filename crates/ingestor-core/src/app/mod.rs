//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **ConsumerLoopBuilder**: ConsumerLoop の構築とワイヤリング
//! - **ConsumerLoop**: 受信→検証→変換→永続化→確認応答のループ
//! - **ConsumerHandle**: spawn したループの停止と合計の回収

pub mod builder;
pub mod consumer_loop;
pub mod handle;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ConsumerLoopBuilder};
pub use self::consumer_loop::{ConsumerLoop, LoopSettings};
pub use self::handle::ConsumerHandle;
