use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use super::schema::init_schema;

/// Fresh in-memory database with the full schema.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn memory_pool() -> SqlitePool {
    memory_pool_with(SqlitePoolOptions::new()).await
}

/// Like [`memory_pool`], but waiting for the one connection gives up after
/// `acquire_timeout` with `PoolTimedOut`.
pub async fn contended_pool(acquire_timeout: Duration) -> SqlitePool {
    memory_pool_with(SqlitePoolOptions::new().acquire_timeout(acquire_timeout)).await
}

async fn memory_pool_with(pool_options: SqlitePoolOptions) -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = pool_options
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("failed to create in-memory pool");

    init_schema(&pool).await.expect("failed to init schema");
    pool
}

/// Make every statement matching `timing` (e.g. `BEFORE INSERT ON order_items`)
/// abort.
pub async fn fail_on(pool: &SqlitePool, name: &str, timing: &str) {
    let statement = format!(
        "CREATE TRIGGER {name} {timing} BEGIN SELECT RAISE(ABORT, 'injected failure'); END"
    );
    sqlx::query(&statement).execute(pool).await.unwrap();
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
