//! # Clock（時刻プロバイダ）と暦の基準タイムゾーン
//!
//! ユースケース層での `Utc::now()` 直接呼び出しを置き換え、
//! テストで固定時刻を注入可能にするための抽象化。
//!
//! 「今日」は常に [`CivilZone`]（既定は IST, UTC+05:30）で決まる。
//! ゾーンはグローバル状態ではなく引数で渡す。

use chrono::{DateTime, FixedOffset, Offset as _, Utc};

use crate::{DomainError, calendar::CanonicalDate};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
   fn now(&self) -> DateTime<Utc>;
}

/// 実際のシステム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
   fn now(&self) -> DateTime<Utc> {
      Utc::now()
   }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
   now: DateTime<Utc>,
}

impl FixedClock {
   pub fn new(now: DateTime<Utc>) -> Self {
      Self { now }
   }
}

impl Clock for FixedClock {
   fn now(&self) -> DateTime<Utc> {
      self.now
   }
}

/// 暦日を決める固定オフセットのタイムゾーン（夏時間なし）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilZone {
   offset: FixedOffset,
   label:  String,
}

impl CivilZone {
   /// UTC からのオフセット（分）とラベルからゾーンを作成する
   ///
   /// オフセットは ±24 時間未満であること。
   pub fn new(offset_minutes: i32, label: impl Into<String>) -> Result<Self, DomainError> {
      let offset = offset_minutes
         .checked_mul(60)
         .and_then(FixedOffset::east_opt)
         .ok_or_else(|| {
            DomainError::Validation(format!(
               "UTC オフセットが範囲外です: {offset_minutes} 分"
            ))
         })?;

      let label = label.into().trim().to_string();
      if label.is_empty() {
         return Err(DomainError::Validation(
            "タイムゾーンのラベルは必須です".to_string(),
         ));
      }

      Ok(Self { offset, label })
   }

   /// インド標準時（UTC+05:30）
   pub fn ist() -> Self {
      Self {
         offset: FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap_or_else(|| Utc.fix()),
         label:  "IST".to_string(),
      }
   }

   pub fn offset(&self) -> FixedOffset {
      self.offset
   }

   pub fn label(&self) -> &str {
      &self.label
   }

   /// 指定時刻がこのゾーンで属する暦日
   pub fn date_of(&self, at: DateTime<Utc>) -> CanonicalDate {
      CanonicalDate::from(at.with_timezone(&self.offset).date_naive())
   }

   /// 時計が示す「今日」
   pub fn today(&self, clock: &dyn Clock) -> CanonicalDate {
      self.date_of(clock.now())
   }
}

#[cfg(test)]
mod tests {
   use chrono::TimeZone;
   use pretty_assertions::assert_eq;

   use super::*;

   #[test]
   fn test_system_clock_は現在時刻を返す() {
      let clock = SystemClock;
      let before = Utc::now();
      let result = clock.now();
      let after = Utc::now();

      assert!(result >= before);
      assert!(result <= after);
   }

   #[test]
   fn test_fixed_clock_は複数回呼んでも同じ時刻を返す() {
      let fixed_time = Utc::now();
      let clock = FixedClock::new(fixed_time);

      assert_eq!(clock.now(), fixed_time);
      assert_eq!(clock.now(), fixed_time);
   }

   #[test]
   fn test_istではutcの18時30分に日付が変わる() {
      let zone = CivilZone::ist();
      let before = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 18, 29, 59).unwrap());
      let after = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 0).unwrap());

      assert_eq!(zone.today(&before), CanonicalDate::from_ymd(2025, 3, 14).unwrap());
      assert_eq!(zone.today(&after), CanonicalDate::from_ymd(2025, 3, 15).unwrap());
   }

   #[test]
   fn test_newで作成したゾーンはistと等しい() {
      assert_eq!(CivilZone::new(330, "IST").unwrap(), CivilZone::ist());
   }

   #[test]
   fn test_負のオフセットも扱える() {
      let zone = CivilZone::new(-300, "EST").unwrap();
      let at = Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap();

      assert_eq!(zone.date_of(at), CanonicalDate::from_ymd(2024, 12, 31).unwrap());
      assert_eq!(zone.label(), "EST");
   }

   #[test]
   fn test_範囲外のオフセットはエラー() {
      assert!(CivilZone::new(24 * 60, "X").is_err());
      assert!(CivilZone::new(i32::MAX, "X").is_err());
   }

   #[test]
   fn test_空のラベルはエラー() {
      assert!(CivilZone::new(0, "  ").is_err());
   }
}
