//! Subscription plan record

use sqlx::FromRow;

/// A row in `subscriptions`: an offering users can be linked to.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlan {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}
