//! # Greeting Dispatcher ライブラリ
//!
//! 設定とユースケースを公開する。バイナリ（`main.rs`）と統合テストから使う。

pub mod config;
pub mod error;
pub mod usecase;
