//! Postgres-backed sessions
//!
//! Each session owns one pool transaction. sqlx rolls a transaction back
//! when it is dropped, so an early return from a handler releases the
//! connection without an explicit call.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{schema, Database, DbError, Session};
use crate::models::{NewPlan, NewUser, NewUserSubscription, Plan, User, UserSubscription};

const USER_COLUMNS: &str = "id, username, email, created_at";
const PLAN_COLUMNS: &str = "id, name, price, description";
const LINK_COLUMNS: &str = "id, user_id, subscription_id, start_date, end_date, status";

/// Pool handle implementing [`Database`]
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn open_session(&self) -> Result<Box<dyn Session>, DbError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }

    async fn create_schema(&self) -> Result<(), DbError> {
        schema::create_schema(&self.pool).await
    }
}

/// Unit of work over a single transaction
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Session for PgSession {
    async fn list_users(&mut self) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(users)
    }

    async fn find_user(&mut self, id: i64) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, DbError> {
        let user = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn list_plans(&mut self) -> Result<Vec<Plan>, DbError> {
        let plans = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscriptions ORDER BY id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(plans)
    }

    async fn find_plan(&mut self, id: i64) -> Result<Option<Plan>, DbError> {
        let plan = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(plan)
    }

    async fn find_plan_by_name(&mut self, name: &str) -> Result<Option<Plan>, DbError> {
        let plan = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscriptions WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(plan)
    }

    async fn insert_plan(&mut self, plan: NewPlan) -> Result<Plan, DbError> {
        let plan = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscriptions (name, price, description)
            VALUES ($1, $2, $3)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(&plan.name)
        .bind(plan.price)
        .bind(plan.description.as_deref())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(plan)
    }

    async fn links_for_user(&mut self, user_id: i64) -> Result<Vec<UserSubscription>, DbError> {
        let links = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM user_subscriptions WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(links)
    }

    async fn find_link(
        &mut self,
        user_id: i64,
        subscription_id: i64,
    ) -> Result<Option<UserSubscription>, DbError> {
        let link = sqlx::query_as(&format!(
            r#"
            SELECT {LINK_COLUMNS} FROM user_subscriptions
            WHERE user_id = $1 AND subscription_id = $2
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(subscription_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(link)
    }

    async fn insert_link(
        &mut self,
        link: NewUserSubscription,
    ) -> Result<UserSubscription, DbError> {
        // COALESCE keeps the column default when no start date is given
        let link = sqlx::query_as(&format!(
            r#"
            INSERT INTO user_subscriptions (user_id, subscription_id, status, start_date)
            VALUES ($1, $2, $3, COALESCE($4, NOW()))
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(link.user_id)
        .bind(link.subscription_id)
        .bind(link.status.as_str())
        .bind(link.start_date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(link)
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DbError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
