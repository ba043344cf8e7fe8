//! # ユースケース層
//!
//! 記念日メールの送信処理を実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: 名簿・台帳・送信・時計を `Arc<dyn Trait>` で外部から注入
//! - **記念日単位の隔離**: 記念日 1 件の失敗は他の記念日に波及しない
//!
//! ## モジュール構成
//!
//! - [`dedup`]: 重複送信防止
//! - [`delivery`]: 再試行つき送信
//! - [`notification`]: メール生成
//! - [`run`]: 1 回分の実行

pub mod dedup;
pub mod delivery;
pub mod notification;
pub mod run;

pub use dedup::{ClaimGuard, DedupTracker};
pub use delivery::{Delivered, DeliveryFailure, DeliveryPipeline, RetryPolicy};
pub use notification::{EmbeddedTemplateProvider, TemplateRenderer};
pub use run::RunCoordinator;
