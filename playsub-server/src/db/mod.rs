//! Database layer - sessions, schema, and backends
//!
//! # Design Principles
//!
//! - One pool built at startup, passed in explicitly (no global engine)
//! - A `Session` is one unit of work; dropping it uncommitted rolls back
//! - Schema creation is idempotent and never migrates existing tables
//! - The (user_id, subscription_id) pair is backed by a unique index

pub mod error;
pub mod pool;
pub mod postgres;
pub mod schema;
pub mod session;

#[cfg(test)]
pub mod memory;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_options, DEFAULT_MAX_CONNECTIONS};
pub use postgres::{PgDatabase, PgSession};
pub use session::{Database, Session};
