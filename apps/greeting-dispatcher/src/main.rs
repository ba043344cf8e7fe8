//! # Greeting Dispatcher
//!
//! 従業員名簿から今日の誕生日・入社記念日・結婚記念日を検出し、
//! お祝いメールを送信するバッチ。
//!
//! ## 役割
//!
//! 1 回の起動で 1 回分の実行を行い、終了する。起動のタイミングは
//! 外部のスケジューラ（cron、systemd timer など）に任せる。
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │  名簿 (CSV)  │────▶│Greeting Dispatcher│────▶│ SMTP サーバー │
//! └──────────────┘     └──────────────────┘     └──────────────┘
//!                              │
//!                              ▼
//!                      ┌──────────────────┐
//!                      │ 送信済み台帳       │
//!                      │ (SQLite / Redis) │
//!                      └──────────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `ROSTER_PATH` | **Yes** | 名簿 CSV のパス |
//! | `TEMPLATE_DIR` | No | テンプレートディレクトリ（未指定なら埋め込み） |
//! | `LEDGER_BACKEND` | No | `sqlite`（デフォルト）または `redis` |
//! | `NOTIFICATION_BACKEND` | No | `noop`（デフォルト）または `smtp` |
//!
//! その他は [`DispatcherConfig`] を参照。
//!
//! ## 終了コード
//!
//! 記念日単位の失敗があっても実行が完了すれば 0。設定エラー、名簿の
//! 読み込み失敗、台帳の接続失敗のときだけ非ゼロで終了する。
//!
//! ## 起動方法
//!
//! ```bash
//! ROSTER_PATH=employees.csv cargo run -p greetflow-dispatcher
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use greetflow_dispatcher::{
   config::{DispatcherConfig, LedgerBackend, NotificationConfig},
   usecase::{
      DedupTracker,
      DeliveryPipeline,
      EmbeddedTemplateProvider,
      RetryPolicy,
      RunCoordinator,
      TemplateRenderer,
   },
};
use greetflow_domain::{clock::SystemClock, run::RunId};
use greetflow_infra::{
   db,
   notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
   redis::create_connection_manager,
   repository::{
      DispatchLedgerRepository,
      RedisDispatchLedgerRepository,
      SqliteDispatchLedgerRepository,
   },
   roster::CsvRosterSource,
   template::{DirectoryTemplateProvider, TemplateProvider},
};
use greetflow_shared::observability::{TracingConfig, init_tracing};
use tracing::Instrument as _;

/// Greeting Dispatcher のエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルを読み込む（存在する場合）
   dotenvy::dotenv().ok();

   // 設定読み込み
   let config = DispatcherConfig::from_env().context("設定の読み込みに失敗しました")?;

   // トレーシング初期化
   let tracing_config = TracingConfig::new(
      "greeting-dispatcher",
      config.log.format,
      config.civil_zone.offset(),
      config.civil_zone.label(),
   )
   .with_log_dir(config.log.dir.clone());
   init_tracing(&tracing_config).context("ログ出力の初期化に失敗しました")?;

   let run_id = RunId::new();
   let span = tracing::info_span!(
      "run",
      service = %tracing_config.service_name,
      run_id = %run_id
   );

   async move {
      let coordinator = build_coordinator(&config).await?;
      let summary = coordinator.run().await?;
      tracing::info!(
         total_sent = summary.total_sent,
         total_failed = summary.total_failed,
         "Greeting Dispatcher を終了します"
      );
      anyhow::Ok(())
   }
   .instrument(span)
   .await
}

/// 設定から依存コンポーネントを組み立てる
async fn build_coordinator(config: &DispatcherConfig) -> anyhow::Result<RunCoordinator> {
   let ledger: Arc<dyn DispatchLedgerRepository> = match &config.ledger.backend {
      LedgerBackend::Sqlite { database_url } => {
         let pool = db::create_pool(database_url)
            .await
            .context("送信済み台帳（SQLite）に接続できませんでした")?;
         db::run_migrations(&pool)
            .await
            .context("送信済み台帳のマイグレーションに失敗しました")?;
         tracing::info!("送信済み台帳（SQLite）に接続しました");
         Arc::new(SqliteDispatchLedgerRepository::new(pool))
      }
      LedgerBackend::Redis { redis_url } => {
         let conn = create_connection_manager(redis_url)
            .await
            .context("送信済み台帳（Redis）に接続できませんでした")?;
         tracing::info!("送信済み台帳（Redis）に接続しました");
         Arc::new(RedisDispatchLedgerRepository::new(
            conn,
            config.ledger.retention_days,
         ))
      }
   };

   let sender: Arc<dyn NotificationSender> = match &config.notification {
      NotificationConfig::Smtp(settings) => {
         tracing::info!(
            host = %settings.host,
            port = settings.port,
            "SMTP でメールを送信します"
         );
         Arc::new(SmtpNotificationSender::new(settings).context("SMTP の設定が不正です")?)
      }
      NotificationConfig::Noop => {
         tracing::info!("Noop モード: メールは送信せずログに出力します");
         Arc::new(NoopNotificationSender)
      }
   };

   let templates: Box<dyn TemplateProvider> = match &config.template_dir {
      Some(dir) => Box::new(
         DirectoryTemplateProvider::load(dir).context("テンプレートを読み込めませんでした")?,
      ),
      None => Box::new(EmbeddedTemplateProvider::new()),
   };

   let policy = RetryPolicy::new(
      config.delivery.max_attempts,
      config.delivery.retry_interval,
   );

   Ok(RunCoordinator::new(
      Arc::new(CsvRosterSource::new(&config.roster_path)),
      DedupTracker::new(ledger),
      TemplateRenderer::new(templates.as_ref()),
      DeliveryPipeline::new(sender, policy),
      Arc::new(SystemClock),
      config.civil_zone.clone(),
   )
   .with_concurrency(config.delivery.concurrency)
   .with_retention_days(config.ledger.retention_days))
}
