//! # 通知送信
//!
//! お祝いメールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（本番・開発用）、Noop（ドライラン用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **失敗の分類**: 送信失敗は一時的／恒久的に分類して返し、
//!   再試行の判断は呼び出し側（DeliveryPipeline）に任せる

mod noop;
mod smtp;

use async_trait::async_trait;
use greetflow_domain::notification::{DeliveryError, EmailMessage};
pub use noop::NoopNotificationSender;
pub use smtp::{SmtpNotificationSender, SmtpSecurity, SmtpSettings};

/// メール送信トレイト
///
/// 1 回の呼び出しが 1 回の送信試行に対応する。再試行はしない。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    ///
    /// `Ok` はトランスポートがメッセージを受理したことを意味する。
    async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError>;
}
