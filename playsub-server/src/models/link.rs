//! User-plan link record

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::SubscriptionStatus;

/// A row in `user_subscriptions`.
///
/// `end_date` is `None` while the link is still running.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserSubscription {
    pub id: i64,
    pub user_id: i64,
    pub subscription_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: SubscriptionStatus,
}

/// Columns supplied when inserting a link. `start_date` defaults to now.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserSubscription {
    pub user_id: i64,
    pub subscription_id: i64,
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime<Utc>>,
}

impl NewUserSubscription {
    /// A fresh active link starting now.
    pub fn active(user_id: i64, subscription_id: i64) -> Self {
        Self {
            user_id,
            subscription_id,
            status: SubscriptionStatus::Active,
            start_date: None,
        }
    }
}
