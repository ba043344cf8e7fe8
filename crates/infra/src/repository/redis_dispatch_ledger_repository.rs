//! # RedisDispatchLedgerRepository
//!
//! 送信済み台帳の Redis 実装。
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `greeting:{day_key}:{event_kind}:{record_id}` | 送信時刻（RFC 3339） | 保持期間 |
//!
//! エントリは TTL で失効するため、[`prune_before`](DispatchLedgerRepository::prune_before)
//! は何もしない。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greetflow_domain::{calendar::CanonicalDate, event::EventKey};
use redis::aio::ConnectionManager;

use super::DispatchLedgerRepository;
use crate::error::InfraError;

/// Redis 実装の DispatchLedgerRepository
#[derive(Clone)]
pub struct RedisDispatchLedgerRepository {
    conn:        ConnectionManager,
    ttl_seconds: u64,
}

impl RedisDispatchLedgerRepository {
    /// 新しいリポジトリインスタンスを作成
    ///
    /// `retention_days` 日経過したエントリは Redis が自動で削除する。
    pub fn new(conn: ConnectionManager, retention_days: u32) -> Self {
        Self {
            conn,
            ttl_seconds: u64::from(retention_days.max(1)) * 24 * 60 * 60,
        }
    }
}

fn ledger_key(key: &EventKey) -> String {
    format!(
        "greeting:{}:{}:{}",
        key.day.day_key(),
        key.kind,
        key.record_id
    )
}

#[async_trait]
impl DispatchLedgerRepository for RedisDispatchLedgerRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(key = %key))]
    async fn is_committed(&self, key: &EventKey) -> Result<bool, InfraError> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(ledger_key(key))
            .query_async(&mut conn)
            .await?;
        Ok(exists)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(key = %key))]
    async fn commit(&self, key: &EventKey, sent_at: DateTime<Utc>) -> Result<bool, InfraError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(ledger_key(key))
            .arg(sent_at.to_rfc3339())
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn prune_before(&self, _day: CanonicalDate) -> Result<u64, InfraError> {
        Ok(0)
    }
}
