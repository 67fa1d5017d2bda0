//! User record

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A row in `users`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Columns supplied when inserting a user. `created_at` defaults to now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}
