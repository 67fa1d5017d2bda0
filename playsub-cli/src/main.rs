//! playsub CLI - subscription backend entry point
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `seed`: populate the database with demo users, plans, and links
//!
//! A `.env` file in the working directory is loaded before flags are
//! parsed, so every `env = ...` fallback can come from it.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "playsub",
    author,
    version,
    about = "Subscription management backend: REST API and demo-data seeder"
)]
struct Cli {
    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create tables and insert demo plans, users, and links
    Seed(commands::seed::SeedArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug })?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Seed(args) => commands::run_seed(args).await?,
    }

    Ok(())
}
