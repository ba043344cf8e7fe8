//! # 実行サマリー
//!
//! 1 回の起動（実行）で何通送り、何件失敗し、何件抑止したかを集計する。
//! 失敗経路はいずれかのカウンタを必ず増やす。

use serde::{Deserialize, Serialize};

use crate::event::EventKind;

define_uuid_id! {
    /// 実行 ID
    ///
    /// ログの `run` スパンに付与し、1 回の起動のログをまとめて追えるようにする。
    pub struct RunId;
}

/// 実行サマリー
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 送信した誕生日メール数
    pub birthdays:              u32,
    /// 送信した入社記念日メール数
    pub work_anniversaries:     u32,
    /// 送信した結婚記念日メール数
    pub marriage_anniversaries: u32,
    pub total_sent:             u32,
    /// レンダリング失敗・送信失敗の合計
    pub total_failed:           u32,
    /// 台帳により抑止した件数
    pub suppressed:             u32,
    /// 棄却したレコード数
    pub invalid_records:        u32,
    /// 書式不正で無効になった日付項目数
    pub date_parse_failures:    u32,
    /// 送信後に台帳へ記録できなかった件数（`total_sent` にも含む）
    pub ledger_failures:        u32,
}

impl RunSummary {
    pub fn record_sent(&mut self, kind: EventKind) {
        match kind {
            EventKind::Birthday => self.birthdays += 1,
            EventKind::WorkAnniversary => self.work_anniversaries += 1,
            EventKind::MarriageAnniversary => self.marriage_anniversaries += 1,
        }
        self.total_sent += 1;
    }

    pub fn record_failed(&mut self) {
        self.total_failed += 1;
    }

    pub fn record_suppressed(&mut self) {
        self.suppressed += 1;
    }

    pub fn record_invalid(&mut self) {
        self.invalid_records += 1;
    }

    pub fn record_date_parse_failure(&mut self) {
        self.date_parse_failures += 1;
    }

    /// 送信は成功したが台帳に記録できなかった
    pub fn record_sent_unrecorded(&mut self, kind: EventKind) {
        self.record_sent(kind);
        self.ledger_failures += 1;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_送信数は種別ごとと合計の両方に加算される() {
        let mut summary = RunSummary::default();

        summary.record_sent(EventKind::Birthday);
        summary.record_sent(EventKind::WorkAnniversary);
        summary.record_sent(EventKind::Birthday);
        summary.record_failed();
        summary.record_suppressed();

        assert_eq!(
            summary,
            RunSummary {
                birthdays: 2,
                work_anniversaries: 1,
                total_sent: 3,
                total_failed: 1,
                suppressed: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_台帳に記録できなかった送信は送信数と台帳失敗数の両方に加算される() {
        let mut summary = RunSummary::default();

        summary.record_sent_unrecorded(EventKind::MarriageAnniversary);

        assert_eq!(
            summary,
            RunSummary {
                marriage_anniversaries: 1,
                total_sent: 1,
                ledger_failures: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_run_idはuuid_v7() {
        let id = RunId::new();

        assert_eq!(id.as_uuid().get_version_num(), 7);
    }
}
