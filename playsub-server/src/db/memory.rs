//! In-memory backend for tests
//!
//! Mirrors the Postgres schema constraints: unique usernames, emails, plan
//! names, and link pairs; links must reference existing rows. Writes are
//! staged per session and applied atomically on commit, re-checking the
//! constraints against whatever other sessions committed meanwhile.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{Database, DbError, Session};
use crate::models::{NewPlan, NewUser, NewUserSubscription, Plan, User, UserSubscription};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    plans: Vec<Plan>,
    links: Vec<UserSubscription>,
}

impl Tables {
    fn check_user(&self, user: &User) -> Result<(), DbError> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(unique("users_username_key"));
        }
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(unique("users_email_key"));
        }
        Ok(())
    }

    fn check_plan(&self, plan: &Plan) -> Result<(), DbError> {
        if self.plans.iter().any(|p| p.name == plan.name) {
            return Err(unique("subscriptions_name_key"));
        }
        Ok(())
    }

    fn check_link(&self, link: &UserSubscription) -> Result<(), DbError> {
        if !self.users.iter().any(|u| u.id == link.user_id) {
            return Err(DbError::Integrity {
                message: format!("user {} does not exist", link.user_id),
            });
        }
        if !self.plans.iter().any(|p| p.id == link.subscription_id) {
            return Err(DbError::Integrity {
                message: format!("subscription {} does not exist", link.subscription_id),
            });
        }
        if self
            .links
            .iter()
            .any(|l| l.user_id == link.user_id && l.subscription_id == link.subscription_id)
        {
            return Err(unique("user_subscriptions_user_plan_key"));
        }
        Ok(())
    }
}

fn unique(constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: constraint.to_owned(),
    }
}

/// Constraint failure to raise from the next link insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    Integrity,
    UniqueViolation,
}

impl InjectedFailure {
    fn into_error(self) -> DbError {
        match self {
            Self::Integrity => DbError::Integrity {
                message: "injected insert failure".into(),
            },
            Self::UniqueViolation => unique("user_subscriptions_user_plan_key"),
        }
    }
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    next_id: AtomicI64,
    schema_created: AtomicBool,
    fail_next_commit: AtomicBool,
    fail_next_link_insert: Mutex<Option<InjectedFailure>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Ids are never reused, like a sequence that ignores rollbacks
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Shared in-memory store
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    shared: Arc<Shared>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_created(&self) -> bool {
        self.shared.schema_created.load(Ordering::SeqCst)
    }

    /// Make the next commit fail with an integrity error.
    pub fn fail_next_commit(&self) {
        self.shared.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make the next `insert_link` fail, as a concurrent writer or a
    /// vanished foreign row would.
    pub fn fail_next_link_insert(&self, failure: InjectedFailure) {
        let mut slot = self
            .shared
            .fail_next_link_insert
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(failure);
    }

    /// Delete a plan behind the application's back.
    pub fn remove_plan(&self, id: i64) {
        self.shared.lock().plans.retain(|p| p.id != id);
    }

    pub fn link_count(&self) -> usize {
        self.shared.lock().links.len()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn open_session(&self) -> Result<Box<dyn Session>, DbError> {
        Ok(Box::new(MemorySession {
            shared: Arc::clone(&self.shared),
            staged: Tables::default(),
        }))
    }

    async fn create_schema(&self) -> Result<(), DbError> {
        self.shared.schema_created.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Session whose writes stay private until commit
pub struct MemorySession {
    shared: Arc<Shared>,
    staged: Tables,
}

impl MemorySession {
    /// Committed rows plus this session's staged rows.
    fn view(&self) -> Tables {
        let mut view = self.shared.lock().clone();
        view.users.extend(self.staged.users.iter().cloned());
        view.plans.extend(self.staged.plans.iter().cloned());
        view.links.extend(self.staged.links.iter().cloned());
        view
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn list_users(&mut self) -> Result<Vec<User>, DbError> {
        let mut users = self.view().users;
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn find_user(&mut self, id: i64) -> Result<Option<User>, DbError> {
        Ok(self.view().users.into_iter().find(|u| u.id == id))
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DbError> {
        Ok(self.view().users.into_iter().find(|u| u.username == username))
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self.view().users.into_iter().find(|u| u.email == email))
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, DbError> {
        let row = User {
            id: self.shared.next_id(),
            username: user.username,
            email: user.email,
            created_at: Utc::now(),
        };
        self.view().check_user(&row)?;
        self.staged.users.push(row.clone());
        Ok(row)
    }

    async fn list_plans(&mut self) -> Result<Vec<Plan>, DbError> {
        let mut plans = self.view().plans;
        plans.sort_by_key(|p| p.id);
        Ok(plans)
    }

    async fn find_plan(&mut self, id: i64) -> Result<Option<Plan>, DbError> {
        Ok(self.view().plans.into_iter().find(|p| p.id == id))
    }

    async fn find_plan_by_name(&mut self, name: &str) -> Result<Option<Plan>, DbError> {
        Ok(self.view().plans.into_iter().find(|p| p.name == name))
    }

    async fn insert_plan(&mut self, plan: NewPlan) -> Result<Plan, DbError> {
        let row = Plan {
            id: self.shared.next_id(),
            name: plan.name,
            price: plan.price,
            description: plan.description,
        };
        self.view().check_plan(&row)?;
        self.staged.plans.push(row.clone());
        Ok(row)
    }

    async fn links_for_user(&mut self, user_id: i64) -> Result<Vec<UserSubscription>, DbError> {
        let mut links: Vec<_> = self
            .view()
            .links
            .into_iter()
            .filter(|l| l.user_id == user_id)
            .collect();
        links.sort_by_key(|l| l.id);
        Ok(links)
    }

    async fn find_link(
        &mut self,
        user_id: i64,
        subscription_id: i64,
    ) -> Result<Option<UserSubscription>, DbError> {
        Ok(self
            .view()
            .links
            .into_iter()
            .find(|l| l.user_id == user_id && l.subscription_id == subscription_id))
    }

    async fn insert_link(
        &mut self,
        link: NewUserSubscription,
    ) -> Result<UserSubscription, DbError> {
        let injected = self
            .shared
            .fail_next_link_insert
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(failure) = injected {
            return Err(failure.into_error());
        }

        let row = UserSubscription {
            id: self.shared.next_id(),
            user_id: link.user_id,
            subscription_id: link.subscription_id,
            start_date: link.start_date.unwrap_or_else(Utc::now),
            end_date: None,
            status: link.status,
        };
        self.view().check_link(&row)?;
        self.staged.links.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        let MemorySession { shared, staged } = *self;
        if shared.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DbError::Integrity {
                message: "injected commit failure".into(),
            });
        }

        let mut tables = shared.lock();
        let mut next = tables.clone();
        for user in staged.users {
            next.check_user(&user)?;
            next.users.push(user);
        }
        for plan in staged.plans {
            next.check_plan(&plan)?;
            next.plans.push(plan);
        }
        for link in staged.links {
            next.check_link(&link)?;
            next.links.push(link);
        }
        *tables = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user_and_plan(db: &MemoryDatabase) -> (User, Plan) {
        let mut session = db.open_session().await.unwrap();
        let user = session
            .insert_user(NewUser {
                username: "pam".into(),
                email: "pam@dundermifflin.com".into(),
            })
            .await
            .unwrap();
        let plan = session
            .insert_plan(NewPlan {
                name: "Basic SD".into(),
                price: 5.99,
                description: None,
            })
            .await
            .unwrap();
        session.commit().await.unwrap();
        (user, plan)
    }

    #[tokio::test]
    async fn uncommitted_writes_are_private() {
        let db = MemoryDatabase::new();
        let mut writer = db.open_session().await.unwrap();
        writer
            .insert_user(NewUser {
                username: "dwight".into(),
                email: "dwight@dundermifflin.com".into(),
            })
            .await
            .unwrap();

        assert_eq!(writer.list_users().await.unwrap().len(), 1);
        let mut reader = db.open_session().await.unwrap();
        assert!(reader.list_users().await.unwrap().is_empty());

        drop(writer);
        assert!(reader.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = MemoryDatabase::new();
        seed_user_and_plan(&db).await;

        let mut session = db.open_session().await.unwrap();
        let err = session
            .insert_user(NewUser {
                username: "pam2".into(),
                email: "pam@dundermifflin.com".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn racing_link_inserts_collide_on_commit() {
        let db = MemoryDatabase::new();
        let (user, plan) = seed_user_and_plan(&db).await;

        let mut first = db.open_session().await.unwrap();
        let mut second = db.open_session().await.unwrap();
        first
            .insert_link(NewUserSubscription::active(user.id, plan.id))
            .await
            .unwrap();
        second
            .insert_link(NewUserSubscription::active(user.id, plan.id))
            .await
            .unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.link_count(), 1);
    }

    #[tokio::test]
    async fn link_requires_existing_rows() {
        let db = MemoryDatabase::new();
        let mut session = db.open_session().await.unwrap();
        let err = session
            .insert_link(NewUserSubscription::active(7, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Integrity { .. }));
    }
}
