//! # ドメイン層エラー定義
//!
//! ビジネスルール違反を表現するエラー型。
//!
//! 日付・名簿レコード・通知に固有のエラーはそれぞれのモジュールで定義し
//! （[`DateParseError`](crate::calendar::DateParseError)、
//! [`RecordInvalid`](crate::employee::RecordInvalid)、
//! [`NotificationError`](crate::notification::NotificationError)）、
//! ここには値オブジェクトの検証失敗のみを置く。
//!
//! ## 使用例
//!
//! ```rust
//! use greetflow_domain::DomainError;
//!
//! fn validate_name(name: &str) -> Result<(), DomainError> {
//!     if name.is_empty() {
//!         return Err(DomainError::Validation("名前は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 不正なフォーマット
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
