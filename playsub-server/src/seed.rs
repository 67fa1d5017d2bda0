//! Demo data seeding
//!
//! Populates the store with the fixed plan catalogue, synthetic users, and
//! random user-plan links. Re-running skips rows that already exist, so
//! the seeder can be pointed at a live database repeatedly.
//!
//! Each phase (plans, users, links) commits in its own session.

use std::collections::HashSet;

use chrono::Utc;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::Fake;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::db::{Database, DbError};
use crate::models::{NewPlan, NewUser, NewUserSubscription, SubscriptionStatus};

/// Maximum attempts to draw a username/email pair not used earlier in the run.
const MAX_NAME_ATTEMPTS: usize = 100;

/// A catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct PlanSeed {
    pub name: &'static str,
    pub price: f64,
    pub description: &'static str,
}

/// The fixed plan catalogue.
pub const PLAN_CATALOGUE: [PlanSeed; 5] = [
    PlanSeed {
        name: "Basic SD",
        price: 5.99,
        description: "Standard Definition streaming, 1 screen",
    },
    PlanSeed {
        name: "Standard HD",
        price: 9.99,
        description: "High Definition streaming, 2 screens",
    },
    PlanSeed {
        name: "Premium 4K",
        price: 15.99,
        description: "Ultra HD/4K streaming, 4 screens",
    },
    PlanSeed {
        name: "Family Plan",
        price: 19.99,
        description: "Family plan with multiple profiles",
    },
    PlanSeed {
        name: "Annual Plan",
        price: 99.99,
        description: "Annual subscription with a discount",
    },
];

/// Seeding knobs
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Users to generate
    pub users: usize,
    /// How many catalogue entries to insert (capped at the catalogue size)
    pub plans: usize,
    /// Upper bound of links drawn per user (at least one is drawn)
    pub max_links_per_user: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            users: 100,
            plans: PLAN_CATALOGUE.len(),
            max_links_per_user: 3,
        }
    }
}

/// Rows inserted by a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub plans_created: usize,
    pub users_created: usize,
    pub links_created: usize,
}

/// Seeding error
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("could not draw a unique username/email after {attempts} attempts")]
    NamesExhausted { attempts: usize },
}

/// Create the schema and insert demo rows.
pub async fn seed<R>(
    db: &dyn Database,
    config: &SeedConfig,
    rng: &mut R,
) -> Result<SeedReport, SeedError>
where
    R: Rng + Send,
{
    db.create_schema().await?;

    let plans_created = seed_plans(db, config.plans).await?;
    tracing::info!(plans_created, "plans seeded");

    let users_created = seed_users(db, config.users, rng).await?;
    tracing::info!(users_created, "users seeded");

    let links_created = seed_links(db, config.max_links_per_user, rng).await?;
    tracing::info!(links_created, "links seeded");

    tracing::info!("Seeding complete.");
    Ok(SeedReport {
        plans_created,
        users_created,
        links_created,
    })
}

async fn seed_plans(db: &dyn Database, count: usize) -> Result<usize, SeedError> {
    let mut session = db.open_session().await?;
    let mut created = 0;

    for plan in PLAN_CATALOGUE.iter().take(count) {
        if session.find_plan_by_name(plan.name).await?.is_some() {
            continue;
        }
        session
            .insert_plan(NewPlan {
                name: plan.name.to_string(),
                price: plan.price,
                description: Some(plan.description.to_string()),
            })
            .await?;
        created += 1;
    }

    session.commit().await?;
    Ok(created)
}

async fn seed_users<R>(db: &dyn Database, count: usize, rng: &mut R) -> Result<usize, SeedError>
where
    R: Rng + Send,
{
    let mut session = db.open_session().await?;
    let mut seen_usernames = HashSet::new();
    let mut seen_emails = HashSet::new();
    let mut created = 0;

    for _ in 0..count {
        let user = draw_user(rng, &mut seen_usernames, &mut seen_emails)?;
        if session.find_user_by_email(&user.email).await?.is_some()
            || session.find_user_by_username(&user.username).await?.is_some()
        {
            tracing::debug!(email = %user.email, "user already present, skipping");
            continue;
        }
        session.insert_user(user).await?;
        created += 1;
    }

    session.commit().await?;
    Ok(created)
}

/// Draw a username/email pair not produced earlier in this run.
fn draw_user<R>(
    rng: &mut R,
    seen_usernames: &mut HashSet<String>,
    seen_emails: &mut HashSet<String>,
) -> Result<NewUser, SeedError>
where
    R: Rng,
{
    for _ in 0..MAX_NAME_ATTEMPTS {
        let username: String = Username().fake_with_rng(rng);
        let email: String = SafeEmail().fake_with_rng(rng);
        if seen_usernames.contains(&username) || seen_emails.contains(&email) {
            continue;
        }
        seen_usernames.insert(username.clone());
        seen_emails.insert(email.clone());
        return Ok(NewUser { username, email });
    }

    Err(SeedError::NamesExhausted {
        attempts: MAX_NAME_ATTEMPTS,
    })
}

async fn seed_links<R>(
    db: &dyn Database,
    max_per_user: usize,
    rng: &mut R,
) -> Result<usize, SeedError>
where
    R: Rng + Send,
{
    let mut session = db.open_session().await?;
    let plans = session.list_plans().await?;
    let users = session.list_users().await?;
    let mut created = 0;

    if plans.is_empty() || max_per_user == 0 {
        session.commit().await?;
        return Ok(0);
    }

    for user in &users {
        let draws = rng.random_range(1..=max_per_user);
        for _ in 0..draws {
            let Some(plan) = plans.choose(rng) else {
                continue;
            };
            if session.find_link(user.id, plan.id).await?.is_some() {
                continue;
            }
            let status = SubscriptionStatus::ALL
                .choose(rng)
                .copied()
                .unwrap_or_default();
            session
                .insert_link(NewUserSubscription {
                    user_id: user.id,
                    subscription_id: plan.id,
                    status,
                    start_date: Some(Utc::now()),
                })
                .await?;
            created += 1;
        }
    }

    session.commit().await?;
    Ok(created)
}
