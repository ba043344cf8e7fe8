//! # Redis 接続管理
//!
//! Redis 台帳（[`RedisDispatchLedgerRepository`](crate::repository::RedisDispatchLedgerRepository)）
//! が使う接続マネージャを作成する。

use redis::aio::ConnectionManager;

use crate::error::InfraError;

/// Redis 接続マネージャを作成する
///
/// `ConnectionManager` は切断時に自動で再接続し、clone して共有できる。
///
/// # 引数
///
/// * `redis_url` - 例: `redis://localhost:6379`
pub async fn create_connection_manager(redis_url: &str) -> Result<ConnectionManager, InfraError> {
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    Ok(manager)
}
