//! RunCoordinator 統合テスト
//!
//! CSV 名簿（一時ファイル）、インメモリ SQLite の台帳、埋め込みテンプレートを
//! 組み合わせ、送信だけをモックにして 1 回分の実行を通す。
//!
//! 実行方法:
//! ```bash
//! cargo test -p greetflow-dispatcher --test run_integration_test
//! ```

use std::{path::Path, sync::Arc, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use greetflow_dispatcher::{
   error::RunError,
   usecase::{
      DedupTracker,
      DeliveryPipeline,
      EmbeddedTemplateProvider,
      RetryPolicy,
      RunCoordinator,
      TemplateRenderer,
   },
};
use greetflow_domain::{
   calendar::CanonicalDate,
   clock::{CivilZone, FixedClock},
   employee::RecordId,
   event::{EventKey, EventKind},
   notification::DeliveryError,
   run::RunSummary,
};
use greetflow_infra::{
   db,
   mock::MockNotificationSender,
   repository::{DispatchLedgerRepository, SqliteDispatchLedgerRepository},
   roster::CsvRosterSource,
   template::DirectoryTemplateProvider,
};
use pretty_assertions::assert_eq;

const HEADER: &str =
   "Employee Name,Email,Date of Birth,Date of Joining,Marriage Anniversary,Department\n";

/// 2025-03-15 08:30 IST
fn morning_of_march_15() -> DateTime<Utc> {
   Utc.with_ymd_and_hms(2025, 3, 15, 3, 0, 0).unwrap()
}

fn write_roster(dir: &Path, rows: &str) -> std::path::PathBuf {
   let path = dir.join("employees.csv");
   std::fs::write(&path, format!("{HEADER}{rows}")).unwrap();
   path
}

async fn sqlite_ledger() -> Arc<SqliteDispatchLedgerRepository> {
   let pool = db::create_memory_pool().await.unwrap();
   db::run_migrations(&pool).await.unwrap();
   Arc::new(SqliteDispatchLedgerRepository::new(pool))
}

fn coordinator(
   roster: &Path,
   ledger: Arc<SqliteDispatchLedgerRepository>,
   sender: &MockNotificationSender,
   now: DateTime<Utc>,
) -> RunCoordinator {
   RunCoordinator::new(
      Arc::new(CsvRosterSource::new(roster)),
      DedupTracker::new(ledger),
      TemplateRenderer::new(&EmbeddedTemplateProvider::new()),
      DeliveryPipeline::new(
         Arc::new(sender.clone()),
         RetryPolicy::new(3, Duration::ZERO),
      ),
      Arc::new(FixedClock::new(now)),
      CivilZone::ist(),
   )
}

fn key(email: &str, kind: EventKind, on: CanonicalDate) -> EventKey {
   EventKey::new(RecordId::from_raw(email), kind, on)
}

fn march_15() -> CanonicalDate {
   CanonicalDate::from_ymd(2025, 3, 15).unwrap()
}

#[tokio::test]
async fn test_誕生日のみの従業員に1通送り台帳に1件記録する() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,Engineering\n",
   );
   let ledger = sqlite_ledger().await;
   let sender = MockNotificationSender::new();

   let summary = coordinator(&roster, ledger.clone(), &sender, morning_of_march_15())
      .run()
      .await
      .unwrap();

   assert_eq!(
      summary,
      RunSummary {
         birthdays: 1,
         total_sent: 1,
         ..Default::default()
      }
   );
   assert_eq!(sender.attempt_count(), 1);
   let sent = sender.sent_emails();
   assert_eq!(sent[0].to, "rajesh@example.com");
   assert_eq!(sent[0].subject, "🎉 Happy Birthday, Rajesh Kumar!");
   assert!(sent[0].html_body.contains("35"));
   assert!(
      ledger
         .is_committed(&key("rajesh@example.com", EventKind::Birthday, march_15()))
         .await
         .unwrap()
   );
}

#[tokio::test]
async fn test_誕生日と入社記念日が同日なら2通送る() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Priya Sharma,priya@example.com,15/03/1988,2015-03-15,,HR\n",
   );
   let ledger = sqlite_ledger().await;
   let sender = MockNotificationSender::new();

   let summary = coordinator(&roster, ledger.clone(), &sender, morning_of_march_15())
      .run()
      .await
      .unwrap();

   assert_eq!(summary.birthdays, 1);
   assert_eq!(summary.work_anniversaries, 1);
   assert_eq!(summary.total_sent, 2);

   let mut subjects: Vec<String> = sender.sent_emails().into_iter().map(|e| e.subject).collect();
   subjects.sort();
   assert_eq!(
      subjects,
      vec![
         "🌟 Happy 10 Year Work Anniversary, Priya Sharma!".to_string(),
         "🎉 Happy Birthday, Priya Sharma!".to_string(),
      ]
   );
   for kind in [EventKind::Birthday, EventKind::WorkAnniversary] {
      assert!(
         ledger
            .is_committed(&key("priya@example.com", kind, march_15()))
            .await
            .unwrap()
      );
   }
}

#[tokio::test]
async fn test_同じ日に2回実行しても2回目は送らない() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,\n\
       Anita Desai,anita@example.com,01-01-1991,15.03.2019,15-03-2017,\n",
   );
   let ledger = sqlite_ledger().await;

   let first_sender = MockNotificationSender::new();
   let first = coordinator(&roster, ledger.clone(), &first_sender, morning_of_march_15())
      .run()
      .await
      .unwrap();

   let second_sender = MockNotificationSender::new();
   let later = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
   let second = coordinator(&roster, ledger, &second_sender, later)
      .run()
      .await
      .unwrap();

   assert_eq!(first.total_sent, 3);
   assert_eq!(second.total_sent, 0);
   assert_eq!(second.suppressed, 3);
   assert_eq!(second_sender.attempt_count(), 0);
}

#[tokio::test]
async fn test_翌日の実行は前日の台帳に影響されない() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,16-03-2020,,\n",
   );
   let ledger = sqlite_ledger().await;
   let sender = MockNotificationSender::new();

   coordinator(&roster, ledger.clone(), &sender, morning_of_march_15())
      .run()
      .await
      .unwrap();
   let next_day = Utc.with_ymd_and_hms(2025, 3, 16, 3, 0, 0).unwrap();
   let summary = coordinator(&roster, ledger, &sender, next_day)
      .run()
      .await
      .unwrap();

   assert_eq!(summary.work_anniversaries, 1);
   assert_eq!(summary.suppressed, 0);
}

#[tokio::test]
async fn test_一時的な失敗は3回まで試行し失敗なら台帳に記録しない() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,\n",
   );
   let ledger = sqlite_ledger().await;
   let sender = MockNotificationSender::new();
   sender.fail_address("rajesh@example.com", DeliveryError::transient("421 busy"));

   let summary = coordinator(&roster, ledger.clone(), &sender, morning_of_march_15())
      .run()
      .await
      .unwrap();

   assert_eq!(summary.total_failed, 1);
   assert_eq!(sender.attempt_count(), 3);
   assert!(
      !ledger
         .is_committed(&key("rajesh@example.com", EventKind::Birthday, march_15()))
         .await
         .unwrap()
   );
}

#[tokio::test]
async fn test_失敗した記念日は次の実行で再送される() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,\n",
   );
   let ledger = sqlite_ledger().await;

   let failing = MockNotificationSender::new();
   failing.fail_address("rajesh@example.com", DeliveryError::permanent("554 rejected"));
   coordinator(&roster, ledger.clone(), &failing, morning_of_march_15())
      .run()
      .await
      .unwrap();
   assert_eq!(failing.attempt_count(), 1);

   let healthy = MockNotificationSender::new();
   let summary = coordinator(&roster, ledger, &healthy, morning_of_march_15())
      .run()
      .await
      .unwrap();

   assert_eq!(summary.total_sent, 1);
}

#[tokio::test]
async fn test_同じメールアドレスの重複行は1通だけ送る() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,\n\
       Rajesh Kumar,Rajesh@Example.com,15-03-1990,10-05-2020,,\n",
   );
   let ledger = sqlite_ledger().await;
   let sender = MockNotificationSender::new();

   let summary = coordinator(&roster, ledger, &sender, morning_of_march_15())
      .run()
      .await
      .unwrap();

   assert_eq!(summary.total_sent, 1);
   assert_eq!(summary.suppressed, 1);
   assert_eq!(sender.attempt_count(), 1);
}

#[tokio::test]
async fn test_必須列がない名簿は実行全体が失敗する() {
   let dir = tempfile::tempdir().unwrap();
   let path = dir.path().join("employees.csv");
   std::fs::write(&path, "Employee Name,Email\nRajesh Kumar,rajesh@example.com\n").unwrap();
   let sender = MockNotificationSender::new();

   let result = coordinator(&path, sqlite_ledger().await, &sender, morning_of_march_15())
      .run()
      .await;

   assert!(matches!(result, Err(RunError::Load(_))));
   assert_eq!(sender.attempt_count(), 0);
}

#[tokio::test]
async fn test_ディレクトリのテンプレートで送信する() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,\n",
   );
   let templates = dir.path().join("templates");
   std::fs::create_dir(&templates).unwrap();
   std::fs::write(
      templates.join("birthday.html"),
      "<p>Dear {{ name }}, happy {{ age }}th!</p>",
   )
   .unwrap();
   let sender = MockNotificationSender::new();

   let provider = DirectoryTemplateProvider::load(&templates).unwrap();
   let summary = RunCoordinator::new(
      Arc::new(CsvRosterSource::new(&roster)),
      DedupTracker::new(sqlite_ledger().await),
      TemplateRenderer::new(&provider),
      DeliveryPipeline::new(
         Arc::new(sender.clone()),
         RetryPolicy::new(3, Duration::ZERO),
      ),
      Arc::new(FixedClock::new(morning_of_march_15())),
      CivilZone::ist(),
   )
   .run()
   .await
   .unwrap();

   assert_eq!(summary.total_sent, 1);
   assert_eq!(
      sender.sent_emails()[0].html_body,
      "<p>Dear Rajesh Kumar, happy 35th!</p>"
   );
   assert_eq!(sender.sent_emails()[0].text_body, None);
}

#[tokio::test]
async fn test_基準タイムゾーンの日付で判定する() {
   let dir = tempfile::tempdir().unwrap();
   let roster = write_roster(
      dir.path(),
      "Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,\n",
   );
   let sender = MockNotificationSender::new();
   // UTC では 3/14 だが IST では 3/15 05:00
   let late_utc = Utc.with_ymd_and_hms(2025, 3, 14, 23, 30, 0).unwrap();

   let summary = coordinator(&roster, sqlite_ledger().await, &sender, late_utc)
      .run()
      .await
      .unwrap();

   assert_eq!(summary.birthdays, 1);
}

#[tokio::test]
async fn test_utf8として不正な行は棄却し他の行は送る() {
   let dir = tempfile::tempdir().unwrap();
   let path = dir.path().join("employees.csv");
   let mut csv = HEADER.as_bytes().to_vec();
   csv.extend_from_slice(b"Rajesh Kumar,rajesh@example.com,15-03-1990,10-05-2020,,\n");
   csv.extend_from_slice(b"Jos\xe9 Garc\xeda,jose@example.com,15-03-1985,10-05-2020,,\n");
   std::fs::write(&path, csv).unwrap();
   let sender = MockNotificationSender::new();
   let sut = coordinator(&path, sqlite_ledger().await, &sender, morning_of_march_15());

   let summary = sut.run().await.unwrap();

   assert_eq!(
      summary,
      RunSummary {
         birthdays: 1,
         total_sent: 1,
         invalid_records: 1,
         ..Default::default()
      }
   );
   assert_eq!(sender.sent_emails()[0].to, "rajesh@example.com");
}
