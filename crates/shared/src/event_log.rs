//! # ビジネスイベントログの構造化ヘルパー
//!
//! 実行ログを `jq` で効率的に調査できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`event.action`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID（従業員のレコード ID など）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const GREETING: &str = "greeting";
        pub const RUN: &str = "run";
    }

    /// イベントアクション
    pub mod action {
        // 記念日検出
        pub const EVENT_DETECTED: &str = "greeting.detected";
        pub const EVENT_SUPPRESSED: &str = "greeting.suppressed";

        // 送信
        pub const SEND_ATTEMPTED: &str = "greeting.send_attempted";
        pub const GREETING_SENT: &str = "greeting.sent";
        pub const GREETING_FAILED: &str = "greeting.failed";

        // 実行
        pub const RUN_STARTED: &str = "run.started";
        pub const RUN_COMPLETED: &str = "run.completed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const EMPLOYEE: &str = "employee";
        pub const LEDGER_ENTRY: &str = "ledger_entry";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
        pub const SKIPPED: &str = "skipped";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（台帳、名簿ファイル）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（SMTP サーバー）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// 入力データ（名簿の行、日付文字列）
        pub const INPUT: &str = "input";
    }

    /// エラー種別
    pub mod kind {
        pub const LEDGER: &str = "ledger";
        pub const DATE_PARSE: &str = "date_parse";
        pub const RECORD_INVALID: &str = "record_invalid";
        pub const TEMPLATE: &str = "template";
        pub const DELIVERY_TRANSIENT: &str = "delivery_transient";
        pub const DELIVERY_PERMANENT: &str = "delivery_permanent";
    }
}
