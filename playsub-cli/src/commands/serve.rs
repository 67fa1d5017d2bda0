//! HTTP server command

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use playsub_server::http::server::DEFAULT_PORT;
use playsub_server::{run_server, ServerConfig};

use super::DbArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Only accept cross-origin requests from localhost
    #[arg(long)]
    pub cors_localhost: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let bind_addr = SocketAddr::new(args.host, args.port);
    tracing::info!("Starting playsub server on {}", bind_addr);

    let db = args.db.connect().await?;

    let config = ServerConfig {
        bind_addr,
        cors_permissive: !args.cors_localhost,
    };

    // Run server (blocks until shutdown)
    run_server(Arc::new(db), config)
        .await
        .context("Server error")?;

    Ok(())
}
