//! # 重複送信防止
//!
//! (レコード, 記念日種別, 暦日) のキー単位で「送ってよいか」を判定し、
//! 送信成功後にキーを台帳へ記録する。
//!
//! ## 判定の流れ
//!
//! 1. [`DedupTracker::claim`] でキーを実行中の集合に登録する（同時実行での二重送信を防ぐ）
//! 2. 台帳に記録済みなら登録を取り消して抑止する
//! 3. 送信に成功したら [`ClaimGuard::commit`] で台帳に記録する
//! 4. 送信に失敗したら [`ClaimGuard`] を drop し、登録を取り消す
//!
//! 送信に成功したキーは台帳への記録に失敗しても実行中の集合に残り、
//! 同じ実行の中で再送されることはない。

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Days, Utc};
use greetflow_domain::{calendar::CanonicalDate, event::EventKey};
use greetflow_infra::{InfraError, repository::DispatchLedgerRepository};

/// 重複送信防止トラッカー
#[derive(Clone)]
pub struct DedupTracker {
    ledger:  Arc<dyn DispatchLedgerRepository>,
    claimed: Arc<Mutex<HashSet<EventKey>>>,
}

impl DedupTracker {
    pub fn new(ledger: Arc<dyn DispatchLedgerRepository>) -> Self {
        Self {
            ledger,
            claimed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn claimed(&self) -> MutexGuard<'_, HashSet<EventKey>> {
        self.claimed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// 送ってよいか
    ///
    /// 台帳に記録済み、またはこの実行で処理中・送信済みなら `false`。
    pub async fn should_send(&self, key: &EventKey) -> Result<bool, InfraError> {
        if self.claimed().contains(key) {
            return Ok(false);
        }
        Ok(!self.ledger.is_committed(key).await?)
    }

    /// 送信成功を台帳に記録する
    ///
    /// 同じキーの二度目の記録は何もせず `false` を返す。
    pub async fn commit(&self, key: &EventKey, sent_at: DateTime<Utc>) -> Result<bool, InfraError> {
        self.ledger.commit(key, sent_at).await
    }

    /// キーの送信権を取得する
    ///
    /// 既に他のタスクが処理中か、台帳に記録済みなら `Ok(None)`。
    pub async fn claim(&self, key: &EventKey) -> Result<Option<ClaimGuard>, InfraError> {
        if !self.claimed().insert(key.clone()) {
            return Ok(None);
        }

        let guard = ClaimGuard {
            tracker: self.clone(),
            key:     key.clone(),
            retain:  false,
        };

        if self.ledger.is_committed(key).await? {
            return Ok(None);
        }

        Ok(Some(guard))
    }

    /// 保持期間を過ぎた台帳エントリを削除する
    ///
    /// `today - retention_days` より前の日のエントリが対象。
    pub async fn reconcile(
        &self,
        today: CanonicalDate,
        retention_days: u32,
    ) -> Result<u64, InfraError> {
        let cutoff = today
            .as_naive_date()
            .checked_sub_days(Days::new(u64::from(retention_days)))
            .ok_or_else(|| InfraError::unexpected(format!("保持期間が大きすぎます: {retention_days} 日")))?;

        self.ledger.prune_before(cutoff.into()).await
    }
}

/// キーの送信権
///
/// drop 時に実行中の集合から取り除く。送信成功後は [`commit`](Self::commit) で
/// 台帳へ記録し、以降この実行では同じキーを処理しない。
pub struct ClaimGuard {
    tracker: DedupTracker,
    key:     EventKey,
    retain:  bool,
}

impl ClaimGuard {
    pub fn key(&self) -> &EventKey {
        &self.key
    }

    /// 送信成功を台帳に記録する
    pub async fn commit(mut self, sent_at: DateTime<Utc>) -> Result<bool, InfraError> {
        self.retain = true;
        self.tracker.commit(&self.key, sent_at).await
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if !self.retain {
            self.tracker.claimed().remove(&self.key);
        }
    }
}
