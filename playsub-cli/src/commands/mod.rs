//! Command implementations for the playsub CLI

pub mod seed;
pub mod serve;

pub use seed::run_seed;
pub use serve::run_serve;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Args;

use playsub_server::db::{create_pool_with_options, DEFAULT_MAX_CONNECTIONS};
use playsub_server::{DatabaseConfig, PgDatabase};

/// Database connection flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// Database user
    #[arg(long, env = "POSTGRES_USER", default_value = "postgres")]
    pub db_user: String,

    /// Database password
    #[arg(long, env = "POSTGRES_PASSWORD", default_value = "postgres", hide_env_values = true)]
    pub db_password: String,

    /// Database name
    #[arg(long, env = "POSTGRES_DB", default_value = "subscription_app")]
    pub db_name: String,

    /// Database host (TCP mode)
    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Database port (TCP mode)
    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// Full connection URL; overrides host/port/user/password/name
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Connect through the managed-cloud Unix socket
    #[arg(long, env = "CLOUD_RUN", value_parser = BoolishValueParser::new())]
    pub cloud_run: bool,

    /// Instance connection name used in cloud mode
    #[arg(long, env = "INSTANCE_CONNECTION_NAME", default_value = "")]
    pub instance_connection_name: String,

    /// Maximum pooled connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl DbArgs {
    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig {
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            host: self.db_host.clone(),
            port: self.db_port,
            url: self.database_url.clone(),
            cloud_run: self.cloud_run,
            instance_connection_name: self.instance_connection_name.clone(),
        }
    }

    /// Build the pool and wrap it as a database handle.
    pub async fn connect(&self) -> Result<PgDatabase> {
        let config = self.config();
        let options = config
            .connect_options()
            .context("Invalid database configuration")?;

        tracing::info!(via = %config.target(), database = %config.database, "Connecting to database");
        let pool = create_pool_with_options(options, self.max_connections)
            .await
            .context("Failed to create database pool")?;

        Ok(PgDatabase::new(pool))
    }
}
