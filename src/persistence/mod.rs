// ============================================================================
// Persistence Layer - SQLite through sqlx
// ============================================================================
//
// Each submodule owns the statements for one group of tables. Functions take
// `&mut SqliteConnection` so the same code runs on a pooled connection or
// inside a transaction (`&mut tx` derefs to the connection).
//
// ============================================================================

pub mod carts;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod schema;
pub mod seed;
pub mod tracking;

#[cfg(test)]
pub mod testing;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::utils::{retry_with_backoff, RetryConfig};

pub use schema::init_schema;

/// Open the pool, retrying transient startup failures.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    tracing::info!(url = %config.url, max_connections = config.max_connections, "Connecting to database");

    let result = retry_with_backoff(&RetryConfig::startup(), |_attempt| {
        let options = options.clone();
        async move {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options)
                .await
        }
    })
    .await;

    let attempts = result.attempts();
    result
        .into_result()
        .map_err(|e| anyhow::anyhow!("Failed to connect to {} after {} attempts: {}", config.url, attempts, e))
}

/// Liveness check used by the health monitor.
pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Wrap a value that failed to parse out of a column.
pub(crate) fn decode_error<E>(error: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(error))
}
