//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで、該当した記念日からお祝いメールを
//! HTML（と任意のプレーンテキスト）で生成する。
//!
//! ## 設計方針
//!
//! - **起動時に一度だけ登録**: プロバイダのテンプレートを `<kind>.html` / `<kind>.txt`
//!   の名前で tera に登録する。構文エラーのテンプレートはその種別だけ使えなくなる
//! - **件名パターン**: `🎉 Happy Birthday, {name}!` など、種別ごとに固定
//! - **未定義のプレースホルダー**: tera のエラーをそのまま [`NotificationError::RenderFailed`] にする
//!
//! ## テンプレート変数
//!
//! | 変数 | 内容 |
//! |---|---|
//! | `name` | 従業員名 |
//! | `count` | 経過年数（全種別） |
//! | `age` | 年齢（誕生日のみ） |
//! | `years` | 経過年数（記念日のみ） |
//! | `department` | 部署（未入力なら空文字） |
//!
//! 数値を序数にする `ordinal` フィルタ（`{{ age | ordinal }}` → `21st`）を登録している。

use std::{collections::HashMap, error::Error as _};

use greetflow_domain::{
    event::{EventKind, EventMatch},
    notification::{EmailMessage, NotificationError},
};
use greetflow_infra::template::TemplateProvider;
use tera::{Context, Tera, Value};

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine:    Tera,
    /// 種別ごとの登録結果。`Ok(true)` はプレーンテキストあり
    available: HashMap<EventKind, Result<bool, String>>,
}

impl TemplateRenderer {
    /// プロバイダのテンプレートを登録する
    pub fn new(provider: &dyn TemplateProvider) -> Self {
        let mut engine = Tera::default();
        engine.register_filter("ordinal", ordinal);
        let mut available = HashMap::new();

        for kind in EventKind::ALL {
            let Some(source) = provider.template(kind) else {
                continue;
            };

            let registered = engine
                .add_raw_template(&format!("{kind}.html"), &source.html)
                .and_then(|()| match &source.text {
                    Some(text) => engine
                        .add_raw_template(&format!("{kind}.txt"), text)
                        .map(|()| true),
                    None => Ok(false),
                })
                .map_err(|e| describe(&e));
            if let Err(reason) = &registered {
                tracing::error!(kind = %kind, reason = %reason, "テンプレートの構文が不正です");
            }
            available.insert(kind, registered);
        }

        Self { engine, available }
    }

    /// 該当した記念日からメールメッセージを生成する
    pub fn render(&self, event: &EventMatch<'_>) -> Result<EmailMessage, NotificationError> {
        let has_text = match self.available.get(&event.kind) {
            None => return Err(NotificationError::TemplateMissing(event.kind)),
            Some(Err(reason)) => return Err(NotificationError::RenderFailed(reason.clone())),
            Some(Ok(has_text)) => *has_text,
        };

        let context = build_context(event);

        let html_body = self
            .engine
            .render(&format!("{}.html", event.kind), &context)
            .map_err(|e| NotificationError::RenderFailed(describe(&e)))?;

        let text_body = if has_text {
            Some(
                self.engine
                    .render(&format!("{}.txt", event.kind), &context)
                    .map_err(|e| NotificationError::RenderFailed(describe(&e)))?,
            )
        } else {
            None
        };

        Ok(EmailMessage {
            to: event.record.email().as_str().to_string(),
            subject: subject(event),
            html_body,
            text_body,
        })
    }
}

fn build_context(event: &EventMatch<'_>) -> Context {
    let record = event.record;
    let mut context = Context::new();
    context.insert("name", record.name().as_str());
    context.insert("count", &event.derived_count);
    context.insert(
        "department",
        record.department().map(|d| d.as_str()).unwrap_or(""),
    );
    let count_key = match event.kind {
        EventKind::Birthday => "age",
        EventKind::WorkAnniversary | EventKind::MarriageAnniversary => "years",
    };
    context.insert(count_key, &event.derived_count);
    context
}

fn subject(event: &EventMatch<'_>) -> String {
    let name = event.record.name().as_str();
    let n = event.derived_count;
    match event.kind {
        EventKind::Birthday => format!("🎉 Happy Birthday, {name}!"),
        EventKind::WorkAnniversary if n == 0 => format!("🌟 Welcome to the team, {name}!"),
        EventKind::WorkAnniversary => format!("🌟 Happy {n} Year Work Anniversary, {name}!"),
        EventKind::MarriageAnniversary => {
            format!("💕 Happy {n} Year Marriage Anniversary, {name}!")
        }
    }
}

/// 数値に英語の序数接尾辞を付ける
fn ordinal(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let n = value
        .as_u64()
        .ok_or_else(|| tera::Error::msg(format!("ordinal には非負の整数が必要です: {value}")))?;
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    Ok(Value::String(format!("{n}{suffix}")))
}

/// tera のエラーは原因が source 側にあるため、連鎖をつなげて 1 行にする
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
