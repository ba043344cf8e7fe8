//! # GreetFlow ドメイン層
//!
//! 記念日判定の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: 生成時に検証され、不正な値を持たない（例: [`calendar::CanonicalDate`],
//!   [`employee::Email`]）
//! - **純粋関数**: 日付正規化と記念日判定は I/O を持たず、「今日」は引数で受け取る
//! - **ドメインエラー**: 検証失敗を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! dispatcher → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、SMTP、ファイル）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`calendar`] - 暦日と日付文字列の正規化
//! - [`clock`] - 時刻プロバイダと暦の基準タイムゾーン
//! - [`employee`] - 名簿レコードの検証
//! - [`event`] - 記念日判定と重複防止キー
//! - [`notification`] - メールメッセージと送信エラー
//! - [`run`] - 実行 ID と実行サマリー

#[macro_use]
mod macros;

pub mod calendar;
pub mod clock;
pub mod employee;
pub mod error;
pub mod event;
pub mod notification;
pub mod run;

pub use error::DomainError;
