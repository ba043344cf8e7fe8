//! # 実行コーディネーター
//!
//! 1 回の起動で、名簿の読み込みからお祝いメールの送信、サマリーの出力までを行う。
//!
//! ## 処理の流れ
//!
//! 1. 時計と基準タイムゾーンから「今日」を決める
//! 2. 保持期間を過ぎた台帳エントリを削除する（失敗は致命的）
//! 3. 名簿を読み込む（失敗は致命的）
//! 4. レコードを検証し、今日の記念日を列挙する
//! 5. 記念日ごとに 取得 → レンダリング → 送信 → 記録 を行う
//! 6. サマリーを出力する
//!
//! 5. は記念日ごとの独立した future として、最大 `concurrency` 件を並行に進める。
//! 記念日単位の失敗はカウンタとログに吸収し、実行は止めない。

use std::sync::Arc;

use futures::{FutureExt, StreamExt, future::BoxFuture, stream};
use greetflow_domain::{
    calendar::CanonicalDate,
    clock::{CivilZone, Clock},
    employee::{EmployeeRecord, EmployeeRow},
    event::{EventKey, EventKind, EventMatch, match_events},
    notification::DeliveryErrorKind,
    run::RunSummary,
};
use greetflow_infra::roster::RosterSource;
use greetflow_shared::{
    event_log::{error, event},
    log_business_event,
};

use crate::{
    error::RunError,
    usecase::{DedupTracker, DeliveryPipeline, TemplateRenderer},
};

/// 同時に処理する記念日の既定数
pub const DEFAULT_CONCURRENCY: usize = 4;

/// 台帳の既定の保持日数
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// 記念日 1 件の処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sent(EventKind),
    /// 送信済みだが台帳への記録に失敗
    SentUnrecorded(EventKind),
    Suppressed,
    Failed,
}

/// 実行コーディネーター
pub struct RunCoordinator {
    roster:         Arc<dyn RosterSource>,
    dedup:          DedupTracker,
    renderer:       TemplateRenderer,
    pipeline:       DeliveryPipeline,
    clock:          Arc<dyn Clock>,
    zone:           CivilZone,
    concurrency:    usize,
    retention_days: u32,
}

impl RunCoordinator {
    pub fn new(
        roster: Arc<dyn RosterSource>,
        dedup: DedupTracker,
        renderer: TemplateRenderer,
        pipeline: DeliveryPipeline,
        clock: Arc<dyn Clock>,
        zone: CivilZone,
    ) -> Self {
        Self {
            roster,
            dedup,
            renderer,
            pipeline,
            clock,
            zone,
            concurrency: DEFAULT_CONCURRENCY,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retention_days(mut self, retention_days: u32) -> Self {
        self.retention_days = retention_days;
        self
    }

    /// 1 回分の実行を行う
    ///
    /// 名簿の読み込みと台帳の整理に失敗した場合のみ `Err` を返す。
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let today = self.zone.today(self.clock.as_ref());

        log_business_event!(
            event.category = event::category::RUN,
            event.action = event::action::RUN_STARTED,
            event.result = event::result::SUCCESS,
            run.today = %today,
            run.zone = self.zone.label(),
            "実行を開始します"
        );

        let pruned = self
            .dedup
            .reconcile(today, self.retention_days)
            .await
            .map_err(RunError::Ledger)?;
        if pruned > 0 {
            tracing::debug!(pruned, retention_days = self.retention_days, "古い台帳エントリを削除しました");
        }

        let rows = self.roster.load().await.map_err(RunError::Load)?;
        tracing::info!(rows = rows.len(), "名簿を読み込みました");

        let mut summary = RunSummary::default();
        let records = validate_rows(&rows, &mut summary);

        let matches: Vec<EventMatch<'_>> = records
            .iter()
            .flat_map(|record| match_events(today, record))
            .collect();

        for matched in &matches {
            log_business_event!(
                event.category = event::category::GREETING,
                event.action = event::action::EVENT_DETECTED,
                event.entity_type = event::entity_type::EMPLOYEE,
                event.entity_id = %matched.record.id(),
                event.result = event::result::SUCCESS,
                greeting.kind = %matched.kind,
                greeting.count = matched.derived_count,
                "記念日を検出しました"
            );
        }

        // Box 化しないと run() の future が Send にならない
        let dispatches: Vec<BoxFuture<'_, Outcome>> = matches
            .into_iter()
            .map(|matched| self.dispatch(matched, today).boxed())
            .collect();

        let outcomes: Vec<Outcome> = stream::iter(dispatches)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Sent(kind) => summary.record_sent(kind),
                Outcome::SentUnrecorded(kind) => summary.record_sent_unrecorded(kind),
                Outcome::Suppressed => summary.record_suppressed(),
                Outcome::Failed => summary.record_failed(),
            }
        }

        log_business_event!(
            event.category = event::category::RUN,
            event.action = event::action::RUN_COMPLETED,
            event.result = event::result::SUCCESS,
            run.today = %today,
            summary.birthdays = summary.birthdays,
            summary.work_anniversaries = summary.work_anniversaries,
            summary.marriage_anniversaries = summary.marriage_anniversaries,
            summary.total_sent = summary.total_sent,
            summary.total_failed = summary.total_failed,
            summary.suppressed = summary.suppressed,
            summary.invalid_records = summary.invalid_records,
            summary.date_parse_failures = summary.date_parse_failures,
            summary.ledger_failures = summary.ledger_failures,
            "実行が完了しました"
        );

        Ok(summary)
    }

    /// 記念日 1 件を処理する
    async fn dispatch(&self, matched: EventMatch<'_>, today: CanonicalDate) -> Outcome {
        let key = EventKey::for_match(&matched, today);

        let guard = match self.dedup.claim(&key).await {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                log_business_event!(
                    event.category = event::category::GREETING,
                    event.action = event::action::EVENT_SUPPRESSED,
                    event.entity_type = event::entity_type::LEDGER_ENTRY,
                    event.entity_id = %key,
                    event.result = event::result::SKIPPED,
                    "送信済みのためスキップします"
                );
                return Outcome::Suppressed;
            }
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::LEDGER,
                    greeting.key = %key,
                    "送信済み台帳の確認に失敗しました: {e}"
                );
                return Outcome::Failed;
            }
        };

        let email = match self.renderer.render(&matched) {
            Ok(email) => email,
            Err(e) => {
                log_business_event!(
                    event.category = event::category::GREETING,
                    event.action = event::action::GREETING_FAILED,
                    event.entity_type = event::entity_type::EMPLOYEE,
                    event.entity_id = %key.record_id,
                    event.result = event::result::FAILURE,
                    error.category = error::category::INPUT,
                    error.kind = error::kind::TEMPLATE,
                    greeting.kind = %matched.kind,
                    "メールを生成できませんでした: {e}"
                );
                return Outcome::Failed;
            }
        };

        match self.pipeline.send(&email).await {
            Ok(delivered) => {
                log_business_event!(
                    event.category = event::category::GREETING,
                    event.action = event::action::GREETING_SENT,
                    event.entity_type = event::entity_type::EMPLOYEE,
                    event.entity_id = %key.record_id,
                    event.result = event::result::SUCCESS,
                    greeting.kind = %matched.kind,
                    greeting.count = matched.derived_count,
                    delivery.attempts = delivered.attempts,
                    "お祝いメールを送信しました: {}",
                    email.subject
                );

                match guard.commit(self.clock.now()).await {
                    Ok(_) => Outcome::Sent(matched.kind),
                    Err(e) => {
                        tracing::error!(
                            error.category = error::category::INFRASTRUCTURE,
                            error.kind = error::kind::LEDGER,
                            greeting.key = %key,
                            "送信済みですが台帳に記録できませんでした: {e}"
                        );
                        Outcome::SentUnrecorded(matched.kind)
                    }
                }
            }
            Err(failure) => {
                let kind = match failure.error.kind {
                    DeliveryErrorKind::Transient => error::kind::DELIVERY_TRANSIENT,
                    DeliveryErrorKind::Permanent => error::kind::DELIVERY_PERMANENT,
                };
                log_business_event!(
                    event.category = event::category::GREETING,
                    event.action = event::action::GREETING_FAILED,
                    event.entity_type = event::entity_type::EMPLOYEE,
                    event.entity_id = %key.record_id,
                    event.result = event::result::FAILURE,
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = kind,
                    greeting.kind = %matched.kind,
                    delivery.attempts = failure.attempts,
                    "お祝いメールを送信できませんでした: {}",
                    failure.error
                );
                Outcome::Failed
            }
        }
    }
}

/// 名簿の行を検証し、有効なレコードだけを返す
fn validate_rows(rows: &[EmployeeRow], summary: &mut RunSummary) -> Vec<EmployeeRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match EmployeeRecord::from_row(row) {
            Ok(validated) => {
                for field in &validated.date_errors {
                    tracing::warn!(
                        error.category = error::category::INPUT,
                        error.kind = error::kind::DATE_PARSE,
                        row = row.row_number,
                        greeting.kind = %field.kind,
                        "日付を解釈できないため、この記念日はスキップします: {}",
                        field.error
                    );
                    summary.record_date_parse_failure();
                }
                records.push(validated.record);
            }
            Err(e) => {
                tracing::warn!(
                    error.category = error::category::INPUT,
                    error.kind = error::kind::RECORD_INVALID,
                    row = e.row(),
                    "レコードをスキップします: {e}"
                );
                summary.record_invalid();
            }
        }
    }
    records
}
