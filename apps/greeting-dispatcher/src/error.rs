//! # Greeting Dispatcher エラー定義
//!
//! 実行全体を中断するエラー（致命的エラー）を定義する。
//! レコード単位・記念日単位のエラーはここには現れず、
//! [`RunCoordinator`](crate::usecase::RunCoordinator) の中でログとカウンタに吸収される。

use greetflow_infra::InfraError;
use thiserror::Error;

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("環境変数 {0} が設定されていません")]
    Missing(&'static str),

    /// 環境変数の値が不正
    #[error("環境変数 {key} の値が不正です: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// 実行を中断するエラー
#[derive(Debug, Error)]
pub enum RunError {
    /// 名簿を読み込めない（ファイルがない、必須列がない）
    #[error("名簿の読み込みに失敗しました: {0}")]
    Load(#[source] InfraError),

    /// 起動時の台帳整理に失敗
    #[error("送信済み台帳の整理に失敗しました: {0}")]
    Ledger(#[source] InfraError),
}
