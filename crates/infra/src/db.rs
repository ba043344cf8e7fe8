//! # SQLite データベース接続管理
//!
//! 送信済み台帳を保存する SQLite への接続プールを作成する。
//!
//! ## 設計方針
//!
//! - **ファイル 1 つ**: 台帳は日次バッチ 1 プロセスからしか書かれないため、
//!   サーバー型 DB ではなく SQLite ファイルで十分
//! - **自動作成**: ファイルが無ければ作成し、マイグレーションでテーブルを用意する
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use greetflow_infra::db;
//!
//! let pool = db::create_pool("sqlite:greetflow-ledger.db").await?;
//! db::run_migrations(&pool).await?;
//! ```

use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::error::InfraError;

/// データベースマイグレーションを実行する
///
/// `sqlx::migrate!()` マクロで埋め込まれたマイグレーションファイルを
/// 順番に適用する。適用済みのマイグレーションはスキップされる。
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), InfraError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// SQLite 接続プールを作成する
///
/// # 引数
///
/// * `database_url` - `sqlite:path/to/file.db` または `sqlite::memory:`
///
/// # 設定値
///
/// - `create_if_missing`: ファイルが無ければ作成する
/// - `max_connections(4)`: 同時送信数に合わせた上限
/// - `acquire_timeout(5秒)`: 接続取得のタイムアウト
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, InfraError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// インメモリの SQLite 接続プールを作成する
///
/// `:memory:` は接続ごとに別のデータベースになるため、接続数を 1 に固定する。
pub async fn create_memory_pool() -> Result<SqlitePool, InfraError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    Ok(pool)
}
