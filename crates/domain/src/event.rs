//! # 記念日判定
//!
//! 「今日」と従業員レコードの各日付を比較し、該当する記念日
//! （[`EventMatch`]）を列挙する。
//!
//! ## 判定ルール
//!
//! - 月日が一致すれば年は問わず該当する
//! - 経過年数は `今日の年 - 日付の年` の単純な引き算
//! - 経過年数 0（入社日が今日）も該当する
//! - 2 月 29 日の日付は、今日が 2 月 29 日のときだけ該当する
//! - 日付の年が今日より後（経過年数が負）の場合は該当しない
//!
//! 誕生日と入社記念日が同じ日なら、それぞれ独立に該当する。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{calendar::CanonicalDate, employee::{EmployeeRecord, RecordId}};

/// 記念日の種別
///
/// 重複送信防止台帳の `event_kind` カラムとテンプレート名に使う。
/// snake_case でシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// 誕生日（生年月日）
    Birthday,
    /// 入社記念日（入社日）
    WorkAnniversary,
    /// 結婚記念日
    MarriageAnniversary,
}

impl EventKind {
    /// 判定順
    pub const ALL: [EventKind; 3] = [
        EventKind::Birthday,
        EventKind::WorkAnniversary,
        EventKind::MarriageAnniversary,
    ];

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// 該当した記念日
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMatch<'a> {
    pub record:        &'a EmployeeRecord,
    pub kind:          EventKind,
    /// 経過年数（誕生日なら年齢）
    pub derived_count: u32,
}

/// 今日に該当する記念日を列挙する
///
/// # 使用例
///
/// ```rust
/// use greetflow_domain::{
///     calendar::CanonicalDate,
///     employee::{EmployeeRecord, EmployeeRow},
///     event::{EventKind, match_events},
/// };
///
/// let row = EmployeeRow {
///     row_number: 2,
///     name: Some("Rajesh Kumar".into()),
///     email: Some("rajesh@example.com".into()),
///     date_of_birth: Some("15-03-1990".into()),
///     date_of_joining: Some("10-05-2020".into()),
///     ..Default::default()
/// };
/// let record = EmployeeRecord::from_row(&row).unwrap().record;
/// let today = CanonicalDate::from_ymd(2025, 3, 15).unwrap();
///
/// let matches = match_events(today, &record);
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].kind, EventKind::Birthday);
/// assert_eq!(matches[0].derived_count, 35);
/// ```
pub fn match_events(today: CanonicalDate, record: &EmployeeRecord) -> Vec<EventMatch<'_>> {
    EventKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let date = record.date_of(kind)?;
            if (date.month(), date.day()) != (today.month(), today.day()) {
                return None;
            }
            let derived_count = u32::try_from(today.year() - date.year()).ok()?;
            Some(EventMatch {
                record,
                kind,
                derived_count,
            })
        })
        .collect()
}

/// 重複送信防止のキー（レコード, 種別, 暦日）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub record_id: RecordId,
    pub kind:      EventKind,
    pub day:       CanonicalDate,
}

impl EventKey {
    pub fn new(record_id: RecordId, kind: EventKind, day: CanonicalDate) -> Self {
        Self {
            record_id,
            kind,
            day,
        }
    }

    /// 該当記念日と今日からキーを作る
    pub fn for_match(event: &EventMatch<'_>, today: CanonicalDate) -> Self {
        Self::new(event.record.id().clone(), event.kind, today)
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.record_id, self.kind, self.day)
    }
}
