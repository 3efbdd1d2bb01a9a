//! Connection pool for the record store.

use std::time::Duration;

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgPool, Postgres};
use tracing::{debug, info, instrument};

use crate::config::{PostgresConfig, describe};
use crate::error::Result;

/// Recycle connections after half an hour.
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(1800);

fn pool_options(config: &PostgresConfig) -> PoolOptions<Postgres> {
    PoolOptions::new()
        .max_connections(config.pool_size)
        .min_connections(1)
        .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .idle_timeout(config.idle_timeout_ms.map(Duration::from_millis))
        .max_lifetime(MAX_CONNECTION_LIFETIME)
        .test_before_acquire(true)
}

/// Validates `config` and opens the pool.
///
/// Every store call waits at most `acquire_timeout_ms` for a connection, so
/// an exhausted pool surfaces as a database error instead of a hung request.
///
/// # Errors
///
/// Returns `PostgresError::Config` for unusable settings and
/// `PostgresError::Connection` when the first connection fails.
#[instrument(skip_all)]
pub async fn create_pool(config: &PostgresConfig) -> Result<PgPool> {
    config.validate()?;
    let connect = config.connect_options()?;

    info!(
        database = %describe(&connect),
        pool_size = config.pool_size,
        acquire_timeout_ms = config.acquire_timeout_ms,
        "Connecting to record store"
    );
    let pool = pool_options(config).connect_with(connect).await?;
    debug!(size = pool.size(), "Record store pool ready");

    Ok(pool)
}
