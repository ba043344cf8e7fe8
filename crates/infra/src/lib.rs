//! # GreetFlow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! 外部システムの詳細（SQLite、Redis、SMTP、名簿ファイル）をトレイトの
//! 背後にカプセル化し、dispatcher のユースケースをインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **名簿の読み込み**: CSV 名簿（[`roster`]）
//! - **テンプレート**: テンプレートファイルの読み込み（[`template`]）
//! - **メール送信**: SMTP / Noop（[`notification`]）
//! - **送信済み台帳**: SQLite / Redis（[`repository`]）
//!
//! ## 依存関係
//!
//! ```text
//! dispatcher → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - SQLite 接続プールとマイグレーション
//! - [`redis`] - Redis 接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信
//! - [`repository`] - 送信済み台帳
//! - [`roster`] - 名簿の読み込み
//! - [`template`] - テンプレートプロバイダ
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use greetflow_infra::{db, repository::SqliteDispatchLedgerRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("sqlite:greetflow-ledger.db").await?;
//!     db::run_migrations(&pool).await?;
//!     let ledger = SqliteDispatchLedgerRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(feature = "test-utils")]
pub mod mock;
pub mod notification;
pub mod redis;
pub mod repository;
pub mod roster;
pub mod template;

pub use error::{InfraError, InfraErrorKind};
