//! # リポジトリ実装
//!
//! 送信済み台帳（重複送信防止）の永続化を提供する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `DispatchLedgerRepository` trait で保存先を抽象化
//! - **2 つの実装**: SQLite（既定、`INSERT ... ON CONFLICT DO NOTHING`）、
//!   Redis（`SET NX EX`、保持期間で自動失効）
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod dispatch_ledger_repository;
pub mod redis_dispatch_ledger_repository;

pub use dispatch_ledger_repository::{DispatchLedgerRepository, SqliteDispatchLedgerRepository};
pub use redis_dispatch_ledger_repository::RedisDispatchLedgerRepository;
