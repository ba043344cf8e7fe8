//! # 暦日と日付正規化
//!
//! 名簿に入力された様々な書式の日付文字列を、年月日の正規形
//! [`CanonicalDate`] に変換する。
//!
//! ## 対応書式（優先順）
//!
//! | 書式 | 例 |
//! |------|----|
//! | `DD-MM-YYYY` | `15-03-1990` |
//! | `DD/MM/YYYY` | `15/03/1990` |
//! | `DD.MM.YYYY` | `15.03.1990` |
//! | `YYYY-MM-DD` | `1990-03-15` |
//!
//! 年は 4 桁必須。月名表記やロケール依存の書式は扱わない。
//! 空文字列は「未入力」として [`normalize`] が `Ok(None)` を返し、
//! 書式に合わない文字列のみが [`DateParseError`] になる。

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 暦日（値オブジェクト）
///
/// 年月日の三つ組。生成時点で暦として有効であることが保証される
/// （2 月 30 日や平年の 2 月 29 日は存在しない）。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    /// 年月日から暦日を作成する
    ///
    /// 暦として存在しない日付の場合は `None` を返す。
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// 2 月 29 日かどうか
    pub fn is_leap_day(&self) -> bool {
        self.month() == 2 && self.day() == 29
    }

    /// 台帳のキーに使う `YYYY-MM-DD` 形式の文字列
    pub fn day_key(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CanonicalDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl std::fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.day_key())
    }
}

/// 日付文字列が対応書式のいずれにも一致しなかった
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("日付を認識できません: {input:?}（対応書式: DD-MM-YYYY, DD/MM/YYYY, DD.MM.YYYY, YYYY-MM-DD）")]
pub struct DateParseError {
    input: String,
}

impl DateParseError {
    /// 認識できなかった入力文字列
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// 年月日の並び
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOrder {
    DayMonthYear,
    YearMonthDay,
}

/// 対応書式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `DD-MM-YYYY`
    DayMonthYearDash,
    /// `DD/MM/YYYY`
    DayMonthYearSlash,
    /// `DD.MM.YYYY`
    DayMonthYearDot,
    /// `YYYY-MM-DD`
    YearMonthDayDash,
}

impl DateFormat {
    /// 試行する優先順
    pub const PRIORITY: [DateFormat; 4] = [
        DateFormat::DayMonthYearDash,
        DateFormat::DayMonthYearSlash,
        DateFormat::DayMonthYearDot,
        DateFormat::YearMonthDayDash,
    ];

    fn separator(self) -> char {
        match self {
            Self::DayMonthYearDash | Self::YearMonthDayDash => '-',
            Self::DayMonthYearSlash => '/',
            Self::DayMonthYearDot => '.',
        }
    }

    fn order(self) -> FieldOrder {
        match self {
            Self::YearMonthDayDash => FieldOrder::YearMonthDay,
            _ => FieldOrder::DayMonthYear,
        }
    }

    /// この書式で文字列を解釈する
    ///
    /// 年は 4 桁、月・日は 1〜2 桁の数字であること。
    pub fn parse(self, text: &str) -> Option<CanonicalDate> {
        let mut parts = text.split(self.separator());
        let (first, second, third) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let (year, month, day) = match self.order() {
            FieldOrder::DayMonthYear => (third, second, first),
            FieldOrder::YearMonthDay => (first, second, third),
        };

        if !is_digits(year, 4..=4) || !is_digits(month, 1..=2) || !is_digits(day, 1..=2) {
            return None;
        }

        CanonicalDate::from_ymd(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    }
}

fn is_digits(s: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// 日付文字列を正規化する
///
/// 前後の空白を除去したうえで、[`DateFormat::PRIORITY`] の順に試し、
/// 最初に成功した書式の結果を返す。
///
/// - 空文字列（空白のみを含む）: `Ok(None)`（未入力）
/// - いずれの書式にも一致しない: `Err(DateParseError)`
///
/// # 使用例
///
/// ```rust
/// use greetflow_domain::calendar::{CanonicalDate, normalize};
///
/// let expected = CanonicalDate::from_ymd(1990, 3, 15);
/// assert_eq!(normalize("15/03/1990").unwrap(), expected);
/// assert_eq!(normalize("1990-03-15").unwrap(), expected);
/// assert_eq!(normalize("   ").unwrap(), None);
/// assert!(normalize("March 15, 1990").is_err());
/// ```
pub fn normalize(text: &str) -> Result<Option<CanonicalDate>, DateParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    DateFormat::PRIORITY
        .iter()
        .find_map(|format| format.parse(trimmed))
        .map(Some)
        .ok_or_else(|| DateParseError {
            input: trimmed.to_string(),
        })
}

/// 欠損しうる日付欄を正規化する
///
/// `None`（セル自体が存在しない）は空文字列と同じく未入力として扱う。
pub fn normalize_opt(text: Option<&str>) -> Result<Option<CanonicalDate>, DateParseError> {
    match text {
        Some(text) => normalize(text),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> CanonicalDate {
        CanonicalDate::from_ymd(year, month, day).unwrap()
    }

    #[rstest]
    #[case("15-03-1990")]
    #[case("15/03/1990")]
    #[case("15.03.1990")]
    #[case("1990-03-15")]
    fn test_4つの書式すべてで同じ暦日になる(#[case] input: &str) {
        assert_eq!(normalize(input).unwrap(), Some(date(1990, 3, 15)));
    }

    #[rstest]
    #[case("01-01-2000", date(2000, 1, 1))]
    #[case("31/12/1999", date(1999, 12, 31))]
    #[case("29.02.2024", date(2024, 2, 29))]
    #[case("2020-05-10", date(2020, 5, 10))]
    #[case("5-3-1990", date(1990, 3, 5))]
    fn test_各書式の代表値を正規化できる(#[case] input: &str, #[case] expected: CanonicalDate) {
        assert_eq!(normalize(input).unwrap(), Some(expected));
    }

    #[test]
    fn test_前後の空白を除去する() {
        assert_eq!(normalize("  10-05-2020\t").unwrap(), Some(date(2020, 5, 10)));
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("   ", "空白のみ")]
    fn test_空入力は未入力として扱う(#[case] input: &str, #[case] _reason: &str) {
        assert_eq!(normalize(input).unwrap(), None);
    }

    #[test]
    fn test_noneは未入力として扱う() {
        assert_eq!(normalize_opt(None).unwrap(), None);
        assert_eq!(normalize_opt(Some("15.03.1990")).unwrap(), Some(date(1990, 3, 15)));
    }

    #[rstest]
    #[case("15-03-90", "2 桁の年")]
    #[case("90-03-15", "2 桁の年（年月日順）")]
    #[case("March 15, 1990", "月名表記")]
    #[case("15 03 1990", "空白区切り")]
    #[case("1990/03/15", "スラッシュの年月日順")]
    #[case("15-03-1990-01", "要素過多")]
    #[case("31-02-2020", "存在しない日付")]
    #[case("29-02-2023", "平年の 2 月 29 日")]
    #[case("15-13-1990", "13 月")]
    #[case("+1-03-1990", "符号付き")]
    fn test_対応外の入力はパース失敗になる(#[case] input: &str, #[case] _reason: &str) {
        let err = normalize(input).unwrap_err();
        assert_eq!(err.input(), input.trim());
    }

    #[test]
    fn test_日付と月が曖昧でも日月年順を優先する() {
        // 03-04-2020 は DD-MM-YYYY として 4 月 3 日
        assert_eq!(normalize("03-04-2020").unwrap(), Some(date(2020, 4, 3)));
    }

    #[test]
    fn test_day_keyはiso形式を返す() {
        assert_eq!(date(2025, 3, 5).day_key(), "2025-03-05");
        assert_eq!(date(2025, 3, 5).to_string(), "2025-03-05");
    }

    #[test]
    fn test_is_leap_dayは2月29日のみ真() {
        assert!(date(2024, 2, 29).is_leap_day());
        assert!(!date(2024, 2, 28).is_leap_day());
        assert!(!date(2024, 3, 1).is_leap_day());
    }
}
