//! playsub-server: subscription management backend
//!
//! A small REST API over users, subscription plans, and the links
//! between them, backed by Postgres, plus a demo-data seeder.

pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod seed;

pub use config::{ConfigError, DatabaseConfig};
pub use db::{Database, DbError, PgDatabase, Session};
pub use http::{run_server, ServerConfig};
