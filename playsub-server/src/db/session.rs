//! Unit-of-work traits
//!
//! Handlers and the seeder talk to storage only through these traits.
//! `PgDatabase` backs them in production; tests use an in-memory backend
//! with the same constraint semantics.

use async_trait::async_trait;

use super::DbError;
use crate::models::{NewPlan, NewUser, NewUserSubscription, Plan, User, UserSubscription};

/// A request-scoped unit of work.
///
/// Reads observe the session's own uncommitted writes. A session that is
/// dropped without `commit` discards its writes.
#[async_trait]
pub trait Session: Send {
    /// All users, ordered by id.
    async fn list_users(&mut self) -> Result<Vec<User>, DbError>;
    async fn find_user(&mut self, id: i64) -> Result<Option<User>, DbError>;
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DbError>;
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError>;
    async fn insert_user(&mut self, user: NewUser) -> Result<User, DbError>;

    /// All plans, ordered by id.
    async fn list_plans(&mut self) -> Result<Vec<Plan>, DbError>;
    async fn find_plan(&mut self, id: i64) -> Result<Option<Plan>, DbError>;
    async fn find_plan_by_name(&mut self, name: &str) -> Result<Option<Plan>, DbError>;
    async fn insert_plan(&mut self, plan: NewPlan) -> Result<Plan, DbError>;

    /// A user's links in insertion order.
    async fn links_for_user(&mut self, user_id: i64) -> Result<Vec<UserSubscription>, DbError>;

    /// Any link for the pair, regardless of status.
    async fn find_link(
        &mut self,
        user_id: i64,
        subscription_id: i64,
    ) -> Result<Option<UserSubscription>, DbError>;

    async fn insert_link(&mut self, link: NewUserSubscription)
        -> Result<UserSubscription, DbError>;

    async fn commit(self: Box<Self>) -> Result<(), DbError>;
    async fn rollback(self: Box<Self>) -> Result<(), DbError>;
}

/// Shared handle to the store, constructed once and injected into handlers.
#[async_trait]
pub trait Database: Send + Sync {
    /// Begin a new unit of work.
    async fn open_session(&self) -> Result<Box<dyn Session>, DbError>;

    /// Create missing tables and indexes. Safe to call repeatedly.
    async fn create_schema(&self) -> Result<(), DbError>;
}
