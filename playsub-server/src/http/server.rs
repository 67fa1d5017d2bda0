//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS by default, localhost-only when requested
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::{Database, DbError};

/// Default listening port when `PORT` is unset
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    pub bind_addr: SocketAddr,

    /// Allow any origin (default: true). When false only localhost
    /// origins are accepted.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            cors_permissive: true,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

/// Build the application router with all routes and layers.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.cors_permissive {
        CorsLayer::permissive()
    } else {
        let port = config.bind_addr.port();
        let origins: Vec<HeaderValue> = ["localhost", "127.0.0.1"]
            .iter()
            .filter_map(|host| HeaderValue::from_str(&format!("http://{host}:{port}")).ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::users::router())
        .merge(routes::subscriptions::router())
        .merge(routes::links::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// Creates any missing tables first, then serves until a shutdown signal.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(DatabaseConfig::default().connect_options()?).await?;
/// run_server(Arc::new(PgDatabase::new(pool)), ServerConfig::default()).await?;
/// ```
pub async fn run_server(db: Arc<dyn Database>, config: ServerConfig) -> Result<(), ServerError> {
    db.create_schema().await?;

    if !config.cors_permissive {
        tracing::info!("CORS: restricted to localhost origins");
    }
    let app = build_router(AppState::new(db), &config);

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema creation failed: {0}")]
    Schema(#[from] DbError),
}
