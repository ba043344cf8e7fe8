//! # テンプレートプロバイダ
//!
//! 記念日の種別ごとのメールテンプレート（HTML と任意のプレーンテキスト）を提供する。
//!
//! ## ディレクトリ構成
//!
//! ```text
//! <TEMPLATE_DIR>/
//! ├── birthday.html
//! ├── birthday.txt              (任意)
//! ├── work_anniversary.html
//! └── marriage_anniversary.html
//! ```
//!
//! ファイル名は [`EventKind`] の snake_case 表現。HTML が無い種別は
//! 「テンプレートなし」として扱い、その種別のメールだけが送れなくなる。

use std::{collections::HashMap, path::Path};

use greetflow_domain::event::EventKind;

use crate::error::InfraError;

/// テンプレートの原文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub html: String,
    pub text: Option<String>,
}

/// テンプレートプロバイダ
pub trait TemplateProvider: Send + Sync {
    /// 種別に対応するテンプレート。無ければ `None`
    fn template(&self, kind: EventKind) -> Option<&TemplateSource>;
}

/// ディレクトリから読み込むテンプレートプロバイダ
///
/// 起動時に一度だけ読み込み、以降はメモリ上の内容を返す。
#[derive(Debug, Clone, Default)]
pub struct DirectoryTemplateProvider {
    templates: HashMap<EventKind, TemplateSource>,
}

impl DirectoryTemplateProvider {
    /// ディレクトリ内のテンプレートを読み込む
    ///
    /// ディレクトリ自体が読めない場合はエラー。個々のファイルの欠落は
    /// エラーにせず警告ログを出す。
    pub fn load(dir: &Path) -> Result<Self, InfraError> {
        if !dir.is_dir() {
            return Err(InfraError::invalid_input(format!(
                "テンプレートディレクトリが見つかりません: {}",
                dir.display()
            )));
        }

        let mut templates = HashMap::new();
        for kind in EventKind::ALL {
            let Some(html) = read_optional(&dir.join(format!("{kind}.html")))? else {
                tracing::warn!(kind = %kind, dir = %dir.display(), "テンプレートがありません");
                continue;
            };
            let text = read_optional(&dir.join(format!("{kind}.txt")))?;
            templates.insert(kind, TemplateSource { html, text });
        }

        Ok(Self { templates })
    }
}

impl TemplateProvider for DirectoryTemplateProvider {
    fn template(&self, kind: EventKind) -> Option<&TemplateSource> {
        self.templates.get(&kind)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, InfraError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
