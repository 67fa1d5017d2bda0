//! Database connection settings
//!
//! Three addressing modes are supported:
//! - cloud: Unix socket under `/cloudsql/{instance}` (managed deployment)
//! - url: explicit `DATABASE_URL` override
//! - discrete: host/port/user/password/database assembled into options
//!
//! Options are built as typed `PgConnectOptions`, so credentials never
//! need URL escaping.

use std::path::PathBuf;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

/// Directory under which managed-cloud instance sockets are mounted.
pub const CLOUD_SQL_SOCKET_ROOT: &str = "/cloudsql";

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
    /// Full connection URL; overrides the discrete parts outside cloud mode
    pub url: Option<String>,
    /// Connect over the cloud Unix socket instead of TCP
    pub cloud_run: bool,
    /// Instance identifier, only read in cloud mode
    pub instance_connection_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "subscription_app".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            url: None,
            cloud_run: false,
            instance_connection_name: String::new(),
        }
    }
}

/// Where the pool will connect, for logging without credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Socket(PathBuf),
    Url,
    Tcp { host: String, port: u16 },
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Socket(path) => write!(f, "unix socket {}", path.display()),
            Self::Url => write!(f, "DATABASE_URL"),
            Self::Tcp { host, port } => write!(f, "tcp {}:{}", host, port),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cloud mode requires an instance connection name")]
    MissingInstance,

    #[error("invalid database URL: {0}")]
    InvalidUrl(#[source] sqlx::Error),
}

impl DatabaseConfig {
    /// Which addressing mode these settings resolve to.
    pub fn target(&self) -> ConnectionTarget {
        if self.cloud_run {
            ConnectionTarget::Socket(
                PathBuf::from(CLOUD_SQL_SOCKET_ROOT).join(&self.instance_connection_name),
            )
        } else if self.url.is_some() {
            ConnectionTarget::Url
        } else {
            ConnectionTarget::Tcp {
                host: self.host.clone(),
                port: self.port,
            }
        }
    }

    /// Build connect options for the resolved addressing mode.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        if self.cloud_run {
            if self.instance_connection_name.is_empty() {
                return Err(ConfigError::MissingInstance);
            }
            let socket =
                PathBuf::from(CLOUD_SQL_SOCKET_ROOT).join(&self.instance_connection_name);
            return Ok(self.credentials(PgConnectOptions::new().socket(socket)));
        }

        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url).map_err(ConfigError::InvalidUrl);
        }

        Ok(self.credentials(PgConnectOptions::new().host(&self.host).port(self.port)))
    }

    fn credentials(&self, options: PgConnectOptions) -> PgConnectOptions {
        options
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}
