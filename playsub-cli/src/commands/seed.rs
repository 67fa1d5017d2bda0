//! Demo data seeding command

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use playsub_server::seed::{seed, SeedConfig, PLAN_CATALOGUE};

use super::DbArgs;

/// Arguments for the seed command
#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Number of users to generate
    #[arg(long, default_value_t = 100)]
    pub users: usize,

    /// Maximum links drawn per user (at least one)
    #[arg(long, default_value_t = 3)]
    pub max_links_per_user: usize,

    /// Seed for the random generator, for reproducible runs
    #[arg(long)]
    pub rng_seed: Option<u64>,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Populate the database with demo rows
pub async fn run_seed(args: SeedArgs) -> Result<()> {
    let db = args.db.connect().await?;

    let mut rng = match args.rng_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    };
    let config = SeedConfig {
        users: args.users,
        plans: PLAN_CATALOGUE.len(),
        max_links_per_user: args.max_links_per_user,
    };

    let report = seed(&db, &config, &mut rng)
        .await
        .context("Seeding failed")?;

    tracing::info!(
        plans = report.plans_created,
        users = report.users_created,
        links = report.links_created,
        "Seed report"
    );
    Ok(())
}
