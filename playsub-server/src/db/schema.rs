//! Table creation
//!
//! Tables are created if absent and never altered afterwards.

use sqlx::PgPool;

use super::DbError;

/// Statements run in order by [`create_schema`].
pub const SCHEMA_STATEMENTS: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subscriptions (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        price DOUBLE PRECISION NOT NULL,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_subscriptions (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        subscription_id BIGINT NOT NULL REFERENCES subscriptions(id),
        start_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        end_date TIMESTAMPTZ,
        status TEXT NOT NULL DEFAULT 'active'
            CHECK (status IN ('active', 'cancelled', 'expired'))
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS user_subscriptions_user_plan_key
        ON user_subscriptions (user_id, subscription_id)
    "#,
];

/// Create all tables and indexes that do not exist yet.
pub async fn create_schema(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Creating tables...");

    let mut tx = pool.begin().await?;
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    Ok(())
}
