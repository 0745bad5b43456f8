//! ingestor-core
//!
//! Core building blocks for the login-event ingestor.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（raw_event, login_record, message, outcome, decision, retry, errors）
//! - **ports**: 抽象化レイヤー（DeliveryQueue, LoginRepository, Clock）
//! - **pipeline**: メッセージ単位の純粋な処理（validator, transformer, hasher）
//! - **app**: アプリケーションロジック（builder, consumer_loop, handle）
//! - **impls**: 実装（in-memory と PostgreSQL）
//! - **config**: 環境変数からの設定
//! - **observability**: バッチ単位の集計

pub mod domain;
pub mod ports;
pub mod pipeline;
pub mod app;
pub mod impls;
pub mod config;
pub mod observability;
