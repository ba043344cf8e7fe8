//! # Observability 基盤
//!
//! トレーシング初期化とログ出力形式の設定を提供する。
//! 環境変数 `LOG_FORMAT` による JSON / Pretty 出力の切り替えに加え、
//! タイムスタンプを固定の市民時間帯（既定は IST, UTC+05:30）で出力する。
//!
//! `LOG_DIR` を指定した場合は、stderr に加えて日次ログファイル
//! `<LOG_DIR>/<YYYY-MM-DD>_<ZONE>.log` にも追記する。

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// ログ出力形式
///
/// 環境変数 `LOG_FORMAT` で切り替える。未設定なら [`Pretty`](LogFormat::Pretty)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 形式（ログ収集基盤向け）
    Json,
    /// 人間が読みやすい形式
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする。不明な値は `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// 市民時間帯でタイムスタンプを整形するタイマー
///
/// ログの各行を `2025-03-15 09:00:00.123 [IST]` の形式で出力する。
#[derive(Debug, Clone)]
pub struct CivilTimer {
    offset: FixedOffset,
    label:  String,
}

impl CivilTimer {
    pub fn new(offset: FixedOffset, label: impl Into<String>) -> Self {
        Self {
            offset,
            label: label.into(),
        }
    }

    /// 指定時刻を市民時間帯の文字列に整形する
    pub fn render(&self, at: DateTime<Utc>) -> String {
        let local = at.with_timezone(&self.offset);
        format!("{} [{}]", local.format("%Y-%m-%d %H:%M:%S%.3f"), self.label)
    }
}

#[cfg(feature = "observability")]
impl tracing_subscriber::fmt::time::FormatTime for CivilTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", self.render(Utc::now()))
    }
}

/// 日次ログファイル名を返す（例: `2025-03-15_IST.log`）
pub fn log_file_name(date: NaiveDate, zone_label: &str) -> String {
    format!("{}_{zone_label}.log", date.format("%Y-%m-%d"))
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// サービス名（`run` スパンの `service` フィールドに出力）
    pub service_name: String,
    /// ログ出力形式
    pub log_format:   LogFormat,
    /// タイムスタンプの時間帯
    pub civil_offset: FixedOffset,
    /// 時間帯のラベル（例: "IST"）
    pub zone_label:   String,
    /// 日次ログファイルの出力先（未指定なら stderr のみ）
    pub log_dir:      Option<PathBuf>,
}

impl TracingConfig {
    /// 新しい設定を作成する
    pub fn new(
        service_name: impl Into<String>,
        log_format: LogFormat,
        civil_offset: FixedOffset,
        zone_label: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            civil_offset,
            zone_label: zone_label.into(),
            log_dir: None,
        }
    }

    /// 日次ログファイルの出力先を設定する
    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    /// 今日の日次ログファイルのパスを返す
    pub fn log_file_path(&self, now: DateTime<Utc>) -> Option<PathBuf> {
        let today = now.with_timezone(&self.civil_offset).date_naive();
        self.log_dir
            .as_ref()
            .map(|dir| dir.join(log_file_name(today, &self.zone_label)))
    }
}

/// トレーシングを初期化する
///
/// `RUST_LOG` 環境変数でログレベルを制御可能。
/// 未設定の場合は `"info,greetflow=debug"` をデフォルトとする。
///
/// JSON モードでは以下のフィールドがトップレベルに出力される:
/// - `timestamp`, `level`, `target`, `message`
///
/// 日次ログファイルのディレクトリ作成・オープンに失敗した場合はエラーを返す。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) -> std::io::Result<()> {
    use std::{fs, sync::Mutex};

    use tracing_subscriber::{Layer as _, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,greetflow=debug".into());

    let timer = CivilTimer::new(config.civil_offset, config.zone_label.clone());

    let stderr_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_timer(timer.clone())
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_timer(timer.clone())
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let file_layer = match config.log_file_path(Utc::now()) {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_timer(timer)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}
