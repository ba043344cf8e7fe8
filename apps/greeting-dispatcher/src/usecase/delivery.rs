//! # 送信パイプライン
//!
//! 1 通のメールを、再試行つきで送信する。
//!
//! ## 再試行ルール
//!
//! - 一時的な失敗（接続断、タイムアウト、SMTP 4xx）は最大試行回数まで再試行する
//! - 恒久的な失敗（不正な宛先、認証拒否、SMTP 5xx）は再試行しない
//! - 試行の間隔は指数的に伸ばす（初回間隔 × 係数^(n-1)、上限あり）
//!
//! 待機は `tokio::time::sleep` で行うため、ある記念日の待機中も
//! 他の記念日の送信は進む。

use std::{sync::Arc, time::Duration};

use greetflow_domain::notification::{DeliveryError, EmailMessage};
use greetflow_infra::notification::NotificationSender;
use greetflow_shared::{event_log::event, log_business_event};

/// 再試行ポリシー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大試行回数（初回を含む）
    pub max_attempts:        u32,
    /// 最初の再試行までの間隔
    pub initial_interval:    Duration,
    /// 再試行ごとに間隔へ掛ける係数
    pub backoff_coefficient: u32,
    /// 間隔の上限
    pub maximum_interval:    Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts:        3,
            initial_interval:    Duration::from_secs(2),
            backoff_coefficient: 2,
            maximum_interval:    Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_interval,
            ..Self::default()
        }
    }

    /// `attempt` 回目の試行が失敗した後、次の試行までの待ち時間
    pub fn retry_interval(&self, attempt: u32) -> Duration {
        let candidate = self
            .backoff_coefficient
            .checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.initial_interval.checked_mul(factor))
            .unwrap_or(Duration::MAX);

        match self.maximum_interval {
            Some(max) => candidate.min(max),
            None => candidate,
        }
    }
}

/// 送信成功
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    /// 成功までに要した試行回数
    pub attempts: u32,
}

/// 送信失敗（再試行を尽くした、または恒久的な失敗）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub attempts: u32,
    pub error:    DeliveryError,
}

/// 送信パイプライン
#[derive(Clone)]
pub struct DeliveryPipeline {
    sender: Arc<dyn NotificationSender>,
    policy: RetryPolicy,
}

impl DeliveryPipeline {
    pub fn new(sender: Arc<dyn NotificationSender>, policy: RetryPolicy) -> Self {
        Self { sender, policy }
    }

    /// メールを送信する
    ///
    /// `Ok` はトランスポートが受理したときだけ返す。
    pub async fn send(&self, email: &EmailMessage) -> Result<Delivered, DeliveryFailure> {
        let mut attempt = 1;
        loop {
            let result = self.sender.send_email(email).await;
            let outcome = if result.is_ok() {
                event::result::SUCCESS
            } else {
                event::result::FAILURE
            };
            log_business_event!(
                event.category = event::category::GREETING,
                event.action = event::action::SEND_ATTEMPTED,
                event.result = outcome,
                delivery.attempt = attempt,
                delivery.max_attempts = self.policy.max_attempts,
                delivery.to = %email.to,
                "送信を試行しました"
            );

            let error = match result {
                Ok(()) => return Ok(Delivered { attempts: attempt }),
                Err(error) => error,
            };

            if !error.is_transient() || attempt >= self.policy.max_attempts {
                tracing::warn!(
                    delivery.attempt = attempt,
                    delivery.to = %email.to,
                    error.kind = %error.kind,
                    error = %error,
                    "送信を断念しました"
                );
                return Err(DeliveryFailure {
                    attempts: attempt,
                    error,
                });
            }

            let wait = self.policy.retry_interval(attempt);
            tracing::warn!(
                delivery.attempt = attempt,
                delivery.to = %email.to,
                retry_in_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "一時的な送信失敗のため再試行します"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}
