//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the first connection cannot be established.
///
/// # Example
///
/// ```ignore
/// let options = DatabaseConfig::default().connect_options()?;
/// let pool = create_pool(options).await?;
/// ```
pub async fn create_pool(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(options, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a PostgreSQL connection pool with a custom connection limit.
///
/// Connections are pinged before being handed out so a restarted server
/// does not surface stale sockets to requests.
pub async fn create_pool_with_options(
    options: PgConnectOptions,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .test_before_acquire(true)
        .connect_with(options)
        .await
}
