//! # 名簿の読み込み
//!
//! 従業員名簿を読み込み、生の行（[`EmployeeRow`]）の一覧を返す。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `RosterSource` trait で名簿の出所を抽象化
//! - **CSV 実装**: 表計算ソフトからエクスポートした CSV を読む
//! - **列の検証は 1 回だけ**: 必須列の有無は読み込み時にヘッダーで確認し、
//!   欠落していれば実行全体を中断する（致命的エラー）
//! - **行の不正は行単位**: UTF-8 として読めないセルは欠損として扱う。
//!   必須項目ならその行だけがドメイン層で棄却される
//!
//! 行単位の検証（必須項目の空欄、日付書式）はドメイン層の
//! [`EmployeeRecord::from_row`](greetflow_domain::employee::EmployeeRecord::from_row) が行う。

use std::{io::Read, path::PathBuf};

use async_trait::async_trait;
use greetflow_domain::employee::{EmployeeRow, columns};

use crate::error::InfraError;

/// 名簿の読み込みトレイト
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// 名簿の全行を読み込む
    ///
    /// 必須列の欠落やファイルの読み込み失敗はエラーを返す。
    async fn load(&self) -> Result<Vec<EmployeeRow>, InfraError>;
}

/// CSV ファイルの名簿
#[derive(Debug, Clone)]
pub struct CsvRosterSource {
    path: PathBuf,
}

impl CsvRosterSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterSource for CsvRosterSource {
    #[tracing::instrument(skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<EmployeeRow>, InfraError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let rows = parse_roster(bytes.as_slice())?;
        tracing::debug!(rows = rows.len(), "名簿を読み込みました");
        Ok(rows)
    }
}

/// ヘッダー上の列位置
struct ColumnIndex {
    name:                 usize,
    email:                usize,
    date_of_birth:        usize,
    date_of_joining:      usize,
    marriage_anniversary: Option<usize>,
    department:           Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, InfraError> {
        let find = |column: &str| headers.iter().position(|header| header.trim() == column);

        let missing: Vec<&str> = columns::REQUIRED
            .iter()
            .copied()
            .filter(|&column| find(column).is_none())
            .collect();

        let (Some(name), Some(email), Some(date_of_birth), Some(date_of_joining)) = (
            find(columns::EMPLOYEE_NAME),
            find(columns::EMAIL),
            find(columns::DATE_OF_BIRTH),
            find(columns::DATE_OF_JOINING),
        ) else {
            return Err(InfraError::invalid_input(format!(
                "名簿に必須列がありません: {}",
                missing.join(", ")
            )));
        };

        Ok(Self {
            name,
            email,
            date_of_birth,
            date_of_joining,
            marriage_anniversary: find(columns::MARRIAGE_ANNIVERSARY),
            department: find(columns::DEPARTMENT),
        })
    }
}

/// CSV を名簿の行に変換する
///
/// 1 行目はヘッダー。列の順序は問わない。セルの前後の空白は除去する。
pub fn parse_roster(reader: impl Read) -> Result<Vec<EmployeeRow>, InfraError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let index = ColumnIndex::from_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for (offset, record) in reader.byte_records().enumerate() {
        let record = record?;
        let row_number = record
            .position()
            .map(|position| usize::try_from(position.line()).unwrap_or(usize::MAX))
            .unwrap_or(offset + 2);
        let cell = |i: usize| decode_cell(&record, i, row_number);

        rows.push(EmployeeRow {
            row_number,
            name: cell(index.name),
            email: cell(index.email),
            date_of_birth: cell(index.date_of_birth),
            date_of_joining: cell(index.date_of_joining),
            marriage_anniversary: index.marriage_anniversary.and_then(cell),
            department: index.department.and_then(cell),
        });
    }

    Ok(rows)
}

/// セルを文字列にする。UTF-8 として不正なセルは欠損にする
fn decode_cell(record: &csv::ByteRecord, index: usize, row_number: usize) -> Option<String> {
    let bytes = record.get(index)?;
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(e) => {
            tracing::warn!(
                row = row_number,
                column = index,
                "UTF-8 として読めないセルを欠損として扱います: {e}"
            );
            None
        }
    }
}
