//! # 通知
//!
//! お祝いメールに関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **テンプレート分離**: 記念日判定とメール生成は分離（TemplateRenderer は dispatcher）
//! - **失敗の分類**: 送信失敗は一時的（[`DeliveryErrorKind::Transient`]）と
//!   恒久的（[`DeliveryErrorKind::Permanent`]）に分け、前者のみ再試行する
//! - **イベント単位の隔離**: どのエラーも実行全体を中断しない

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::event::EventKind;

/// メール生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// 記念日の種別に対応するテンプレートがない
    #[error("テンプレートが見つかりません: {0}")]
    TemplateMissing(EventKind),

    /// テンプレートレンダリングに失敗（未定義のプレースホルダーなど）
    #[error("テンプレートレンダリングに失敗: {0}")]
    RenderFailed(String),
}

/// 送信失敗の分類
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// 接続断・タイムアウト・SMTP 4xx など、時間をおけば成功しうる
    Transient,
    /// 不正な宛先・認証拒否・SMTP 5xx など、介入なしには成功しない
    Permanent,
}

/// 送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("メール送信に失敗（{kind}）: {message}")]
pub struct DeliveryError {
    pub kind:    DeliveryErrorKind,
    pub message: String,
}

impl DeliveryError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind:    DeliveryErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind:    DeliveryErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == DeliveryErrorKind::Transient
    }
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文（テンプレートがある場合のみ）
    pub text_body: Option<String>,
}
