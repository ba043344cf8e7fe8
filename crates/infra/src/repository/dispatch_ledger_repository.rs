//! # DispatchLedgerRepository
//!
//! 送信済み台帳の永続化を担当するリポジトリ。
//!
//! キーは (レコード ID, 記念日種別, 暦日)。送信に成功したときだけ記録し、
//! 同じキーの二度目の記録は何もしない。別の日のエントリは今日の判定に
//! 影響しないため、保持期間を過ぎたものは削除してよい。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greetflow_domain::{calendar::CanonicalDate, event::EventKey};
use sqlx::SqlitePool;

use crate::error::InfraError;

/// 送信済み台帳リポジトリトレイト
#[async_trait]
pub trait DispatchLedgerRepository: Send + Sync {
    /// キーが記録済みか
    async fn is_committed(&self, key: &EventKey) -> Result<bool, InfraError>;

    /// 送信成功を記録する
    ///
    /// 新たに記録した場合は `true`、既に記録済みだった場合は `false` を返す。
    async fn commit(&self, key: &EventKey, sent_at: DateTime<Utc>) -> Result<bool, InfraError>;

    /// 指定日より前のエントリを削除し、削除件数を返す
    async fn prune_before(&self, day: CanonicalDate) -> Result<u64, InfraError>;
}

/// SQLite 実装の DispatchLedgerRepository
#[derive(Debug, Clone)]
pub struct SqliteDispatchLedgerRepository {
    pool: SqlitePool,
}

impl SqliteDispatchLedgerRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchLedgerRepository for SqliteDispatchLedgerRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(key = %key))]
    async fn is_committed(&self, key: &EventKey) -> Result<bool, InfraError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM dispatch_ledger
            WHERE record_id = ? AND event_kind = ? AND day_key = ?
            "#,
        )
        .bind(key.record_id.as_str())
        .bind(key.kind.as_str())
        .bind(key.day.day_key())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(key = %key))]
    async fn commit(&self, key: &EventKey, sent_at: DateTime<Utc>) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            INSERT INTO dispatch_ledger (record_id, event_kind, day_key, sent_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (record_id, event_kind, day_key) DO NOTHING
            "#,
        )
        .bind(key.record_id.as_str())
        .bind(key.kind.as_str())
        .bind(key.day.day_key())
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(before = %day))]
    async fn prune_before(&self, day: CanonicalDate) -> Result<u64, InfraError> {
        let result = sqlx::query("DELETE FROM dispatch_ledger WHERE day_key < ?")
            .bind(day.day_key())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
