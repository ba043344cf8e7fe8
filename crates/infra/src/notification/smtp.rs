//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! Gmail / Outlook などの SMTP リレーや、開発環境の Mailpit に接続する。
//!
//! ## 失敗の分類
//!
//! | 失敗 | 分類 |
//! |------|------|
//! | 宛先・送信元アドレスの形式不正 | 恒久的 |
//! | SMTP 5xx（認証拒否、宛先不明など） | 恒久的 |
//! | SMTP 4xx、接続断、タイムアウト、TLS 失敗 | 一時的 |

use std::time::Duration;

use async_trait::async_trait;
use greetflow_domain::notification::{DeliveryError, EmailMessage};
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::NotificationSender;
use crate::error::InfraError;

/// 接続の暗号化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// 平文で接続後に STARTTLS（ポート 587）
    StartTls,
    /// 最初から TLS（ポート 465）
    Tls,
    /// 暗号化なし（Mailpit などローカル SMTP 向け）
    None,
}

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host:         String,
    pub port:         u16,
    pub security:     SmtpSecurity,
    /// (ユーザー名, パスワード)
    pub credentials:  Option<(String, String)>,
    /// 1 回の送信試行のタイムアウト
    pub timeout:      Duration,
    pub from_address: String,
}

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpNotificationSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from:      Mailbox,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 接続はここでは張らず、最初の送信時に確立する。
    /// 送信元アドレスや TLS 設定が不正な場合はエラーを返す。
    pub fn new(settings: &SmtpSettings) -> Result<Self, InfraError> {
        let from: Mailbox = settings.from_address.parse().map_err(|e| {
            InfraError::invalid_input(format!(
                "送信元アドレス不正: {}: {e}",
                settings.from_address
            ))
        })?;

        let builder = match settings.security {
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host),
            SmtpSecurity::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &settings.host,
            )),
        }
        .map_err(|e| InfraError::invalid_input(format!("SMTP 設定不正: {e}")))?;

        let mut builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));
        if let Some((username, password)) = &settings.credentials {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, DeliveryError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| DeliveryError::permanent(format!("宛先アドレス不正: {}: {e}", email.to)))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject);

        let html = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone());

        let message = match &email.text_body {
            Some(text) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.clone()),
                    )
                    .singlepart(html),
            ),
            None => builder.singlepart(html),
        };

        message.map_err(|e| DeliveryError::permanent(format!("メッセージ構築失敗: {e}")))
    }
}

/// lettre のエラーを一時的／恒久的に分類する
fn classify(error: &lettre::transport::smtp::Error) -> DeliveryError {
    if error.is_permanent() || error.is_client() {
        DeliveryError::permanent(format!("SMTP 送信失敗: {error}"))
    } else {
        DeliveryError::transient(format!("SMTP 送信失敗: {error}"))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| classify(&e))?;

        Ok(())
    }
}
