//! # 通知ユースケース
//!
//! お祝いメールの生成を担う。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによるメール生成
//! - [`embedded`] - バイナリに埋め込んだ既定のテンプレート

pub mod embedded;
pub mod template_renderer;

pub use embedded::EmbeddedTemplateProvider;
pub use template_renderer::TemplateRenderer;
