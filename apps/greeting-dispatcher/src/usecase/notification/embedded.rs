//! # 埋め込みテンプレート
//!
//! `templates/greetings/` のテンプレートをバイナリに埋め込んだプロバイダ。
//! `TEMPLATE_DIR` を指定しない場合に使われる。

use std::collections::HashMap;

use greetflow_domain::event::EventKind;
use greetflow_infra::template::{TemplateProvider, TemplateSource};

/// 埋め込みテンプレートプロバイダ
#[derive(Debug, Clone)]
pub struct EmbeddedTemplateProvider {
    templates: HashMap<EventKind, TemplateSource>,
}

impl EmbeddedTemplateProvider {
    pub fn new() -> Self {
        let templates = [
            (
                EventKind::Birthday,
                include_str!("../../../templates/greetings/birthday.html"),
                include_str!("../../../templates/greetings/birthday.txt"),
            ),
            (
                EventKind::WorkAnniversary,
                include_str!("../../../templates/greetings/work_anniversary.html"),
                include_str!("../../../templates/greetings/work_anniversary.txt"),
            ),
            (
                EventKind::MarriageAnniversary,
                include_str!("../../../templates/greetings/marriage_anniversary.html"),
                include_str!("../../../templates/greetings/marriage_anniversary.txt"),
            ),
        ]
        .into_iter()
        .map(|(kind, html, text)| {
            (
                kind,
                TemplateSource {
                    html: html.to_string(),
                    text: Some(text.to_string()),
                },
            )
        })
        .collect();

        Self { templates }
    }
}

impl Default for EmbeddedTemplateProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateProvider for EmbeddedTemplateProvider {
    fn template(&self, kind: EventKind) -> Option<&TemplateSource> {
        self.templates.get(&kind)
    }
}
