//! # 従業員レコード
//!
//! 名簿の 1 行（[`EmployeeRow`]）を検証し、記念日判定に使える
//! [`EmployeeRecord`] に変換する。
//!
//! ## 検証ルール
//!
//! | 項目 | 必須 | 不備のとき |
//! |------|------|-----------|
//! | 従業員名 | ✓ | レコードを棄却（[`RecordInvalid`]） |
//! | メールアドレス | ✓ | レコードを棄却 |
//! | 生年月日 | ✓ | 未入力なら棄却、書式不正ならその項目のみ無効 |
//! | 入社日 | ✓ | 同上 |
//! | 結婚記念日 | | 書式不正ならその項目のみ無効 |
//! | 部署 | | なし |
//!
//! 書式不正の日付は [`ValidatedRecord::date_errors`] に集められ、
//! 呼び出し側がログとカウンタに反映する。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    DomainError,
    calendar::{self, CanonicalDate, DateParseError},
    event::EventKind,
};

/// 名簿の列名
pub mod columns {
    pub const EMPLOYEE_NAME: &str = "Employee Name";
    pub const EMAIL: &str = "Email";
    pub const DATE_OF_BIRTH: &str = "Date of Birth";
    pub const DATE_OF_JOINING: &str = "Date of Joining";
    pub const MARRIAGE_ANNIVERSARY: &str = "Marriage Anniversary";
    pub const DEPARTMENT: &str = "Department";

    /// 読み込み時に存在を確認する列
    pub const REQUIRED: [&str; 4] = [EMPLOYEE_NAME, EMAIL, DATE_OF_BIRTH, DATE_OF_JOINING];
}

define_validated_string! {
    /// 従業員名（値オブジェクト）
    pub struct EmployeeName {
        label: "従業員名",
        max_length: 200,
    }
}

define_validated_string! {
    /// 部署名（値オブジェクト）
    pub struct Department {
        label: "部署名",
        max_length: 200,
    }
}

/// メールアドレス（値オブジェクト）
///
/// 前後の空白を除去したうえで `local@domain` の形式を要求する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `@` の前後が空でない
    /// - 空白を含まない
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        };

        if local.is_empty() || domain.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// レコード識別子
///
/// 小文字化したメールアドレス。重複送信防止台帳のキーになる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// 台帳から読み出した値などから復元する
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Email> for RecordId {
    fn from(email: &Email) -> Self {
        Self(email.as_str().to_lowercase())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 名簿の生の 1 行
///
/// 列が存在しないセルは `None`、空セルは空文字列のまま保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeRow {
    /// ヘッダーを 1 行目とした行番号
    pub row_number:           usize,
    pub name:                 Option<String>,
    pub email:                Option<String>,
    pub date_of_birth:        Option<String>,
    pub date_of_joining:      Option<String>,
    pub marriage_anniversary: Option<String>,
    pub department:           Option<String>,
}

/// 棄却されたレコード
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordInvalid {
    /// 必須項目が未入力
    #[error("{row} 行目: 必須項目「{field}」が未入力です")]
    MissingField { row: usize, field: &'static str },

    /// 項目の値が不正
    #[error("{row} 行目: {source}")]
    InvalidField {
        row:    usize,
        #[source]
        source: DomainError,
    },
}

impl RecordInvalid {
    pub fn row(&self) -> usize {
        match self {
            Self::MissingField { row, .. } | Self::InvalidField { row, .. } => *row,
        }
    }
}

/// 書式不正で無効になった日付項目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFieldError {
    pub kind:  EventKind,
    pub error: DateParseError,
}

/// 検証済みレコードと、無効になった日付項目
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    pub record:      EmployeeRecord,
    pub date_errors: Vec<DateFieldError>,
}

/// 従業員レコード（検証済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    id:                   RecordId,
    name:                 EmployeeName,
    email:                Email,
    date_of_birth:        Option<CanonicalDate>,
    date_of_joining:      Option<CanonicalDate>,
    marriage_anniversary: Option<CanonicalDate>,
    department:           Option<Department>,
}

impl EmployeeRecord {
    /// 検証済みの値からレコードを組み立てる
    pub fn new(
        name: EmployeeName,
        email: Email,
        date_of_birth: Option<CanonicalDate>,
        date_of_joining: Option<CanonicalDate>,
        marriage_anniversary: Option<CanonicalDate>,
        department: Option<Department>,
    ) -> Self {
        Self {
            id: RecordId::from(&email),
            name,
            email,
            date_of_birth,
            date_of_joining,
            marriage_anniversary,
            department,
        }
    }

    /// 名簿の 1 行を検証する
    pub fn from_row(row: &EmployeeRow) -> Result<ValidatedRecord, RecordInvalid> {
        let line = row.row_number;
        let invalid = |source| RecordInvalid::InvalidField { row: line, source };

        let name = required(row.name.as_deref(), line, columns::EMPLOYEE_NAME)?;
        let name = EmployeeName::new(name).map_err(invalid)?;

        let email = required(row.email.as_deref(), line, columns::EMAIL)?;
        let email = Email::new(email).map_err(invalid)?;

        let date_of_birth = required(row.date_of_birth.as_deref(), line, columns::DATE_OF_BIRTH)?;
        let date_of_joining =
            required(row.date_of_joining.as_deref(), line, columns::DATE_OF_JOINING)?;

        let department = row
            .department
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(Department::new)
            .transpose()
            .map_err(invalid)?;

        let mut date_errors = Vec::new();
        let mut parse = |kind, text: Option<&str>| match calendar::normalize_opt(text) {
            Ok(date) => date,
            Err(error) => {
                date_errors.push(DateFieldError { kind, error });
                None
            }
        };

        let date_of_birth = parse(EventKind::Birthday, Some(date_of_birth));
        let date_of_joining = parse(EventKind::WorkAnniversary, Some(date_of_joining));
        let marriage_anniversary = parse(
            EventKind::MarriageAnniversary,
            row.marriage_anniversary.as_deref(),
        );

        Ok(ValidatedRecord {
            record: Self::new(
                name,
                email,
                date_of_birth,
                date_of_joining,
                marriage_anniversary,
                department,
            ),
            date_errors,
        })
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &EmployeeName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn department(&self) -> Option<&Department> {
        self.department.as_ref()
    }

    /// 記念日の種別に対応する日付
    pub fn date_of(&self, kind: EventKind) -> Option<CanonicalDate> {
        match kind {
            EventKind::Birthday => self.date_of_birth,
            EventKind::WorkAnniversary => self.date_of_joining,
            EventKind::MarriageAnniversary => self.marriage_anniversary,
        }
    }
}

fn required<'a>(
    value: Option<&'a str>,
    row: usize,
    field: &'static str,
) -> Result<&'a str, RecordInvalid> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(RecordInvalid::MissingField { row, field })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn row() -> EmployeeRow {
        EmployeeRow {
            row_number:           2,
            name:                 Some("Rajesh Kumar".to_string()),
            email:                Some("Rajesh.Kumar@Example.com".to_string()),
            date_of_birth:        Some("15-03-1990".to_string()),
            date_of_joining:      Some("10-05-2020".to_string()),
            marriage_anniversary: Some(String::new()),
            department:           Some("Engineering".to_string()),
        }
    }

    #[test]
    fn test_正常な行はレコードになる() {
        let validated = EmployeeRecord::from_row(&row()).unwrap();
        let record = validated.record;

        assert!(validated.date_errors.is_empty());
        assert_eq!(record.name().as_str(), "Rajesh Kumar");
        assert_eq!(record.email().as_str(), "Rajesh.Kumar@Example.com");
        assert_eq!(record.id().as_str(), "rajesh.kumar@example.com");
        assert_eq!(record.department().map(Department::as_str), Some("Engineering"));
        assert_eq!(
            record.date_of(EventKind::Birthday),
            CanonicalDate::from_ymd(1990, 3, 15)
        );
        assert_eq!(
            record.date_of(EventKind::WorkAnniversary),
            CanonicalDate::from_ymd(2020, 5, 10)
        );
        assert_eq!(record.date_of(EventKind::MarriageAnniversary), None);
    }

    #[rstest]
    #[case::名前なし(EmployeeRow { name: None, ..row() }, columns::EMPLOYEE_NAME)]
    #[case::名前が空白(EmployeeRow { name: Some("  ".to_string()), ..row() }, columns::EMPLOYEE_NAME)]
    #[case::メールなし(EmployeeRow { email: Some(String::new()), ..row() }, columns::EMAIL)]
    #[case::生年月日なし(EmployeeRow { date_of_birth: None, ..row() }, columns::DATE_OF_BIRTH)]
    #[case::入社日なし(EmployeeRow { date_of_joining: Some(" ".to_string()), ..row() }, columns::DATE_OF_JOINING)]
    fn test_必須項目の欠落はレコード棄却(#[case] input: EmployeeRow, #[case] field: &'static str) {
        let err = EmployeeRecord::from_row(&input).unwrap_err();

        assert_eq!(err, RecordInvalid::MissingField { row: 2, field });
    }

    #[test]
    fn test_不正なメールアドレスはレコード棄却() {
        let input = EmployeeRow {
            email: Some("not-an-address".to_string()),
            ..row()
        };

        let err = EmployeeRecord::from_row(&input).unwrap_err();

        assert!(matches!(err, RecordInvalid::InvalidField { row: 2, .. }));
        assert_eq!(err.row(), 2);
    }

    #[test]
    fn test_書式不正の必須日付はその項目のみ無効になる() {
        let input = EmployeeRow {
            date_of_birth: Some("15-03-90".to_string()),
            ..row()
        };

        let validated = EmployeeRecord::from_row(&input).unwrap();

        assert_eq!(validated.record.date_of(EventKind::Birthday), None);
        assert!(validated.record.date_of(EventKind::WorkAnniversary).is_some());
        assert_eq!(validated.date_errors.len(), 1);
        assert_eq!(validated.date_errors[0].kind, EventKind::Birthday);
        assert_eq!(validated.date_errors[0].error.input(), "15-03-90");
    }

    #[test]
    fn test_書式不正の結婚記念日は日付エラーとして報告される() {
        let input = EmployeeRow {
            marriage_anniversary: Some("June 1st".to_string()),
            ..row()
        };

        let validated = EmployeeRecord::from_row(&input).unwrap();

        assert_eq!(validated.date_errors.len(), 1);
        assert_eq!(validated.date_errors[0].kind, EventKind::MarriageAnniversary);
    }

    #[test]
    fn test_空の部署は未設定として扱う() {
        let input = EmployeeRow {
            department: Some(" ".to_string()),
            ..row()
        };

        let validated = EmployeeRecord::from_row(&input).unwrap();

        assert_eq!(validated.record.department(), None);
    }

    #[rstest]
    #[case("user@example.com", true)]
    #[case(" user@example.com ", true)]
    #[case("", false)]
    #[case("user.example.com", false)]
    #[case("@example.com", false)]
    #[case("user@", false)]
    #[case("us er@example.com", false)]
    fn test_メールアドレスの検証(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(Email::new(input).is_ok(), ok);
    }

    #[test]
    fn test_record_idは大文字小文字を区別しない() {
        let upper = Email::new("A@B.COM").unwrap();
        let lower = Email::new("a@b.com").unwrap();

        assert_eq!(RecordId::from(&upper), RecordId::from(&lower));
        assert_eq!(RecordId::from_raw("A@B.COM"), RecordId::from(&lower));
    }
}
