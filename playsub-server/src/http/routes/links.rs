//! User-plan link endpoints
//!
//! - GET lists a user's links, resolving each plan name with its own lookup
//! - POST creates an active link after existence and duplicate checks

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::Session;
use crate::http::error::ApiError;
use crate::http::extractors::UserId;
use crate::http::server::AppState;
use crate::models::{NewUserSubscription, SubscriptionStatus, ValidationError};

/// Add link request
#[derive(Debug, Deserialize)]
pub struct AddSubscriptionRequest {
    #[serde(default)]
    pub subscription_id: Option<IdInput>,
}

/// Loosely typed id as clients send it: `2`, `2.0`, or `"2"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Number(serde_json::Number),
    Text(String),
    Flag(bool),
}

impl AddSubscriptionRequest {
    /// Resolve the plan id. Absent, null, zero, empty, and `false` all count
    /// as missing; numeric strings are accepted like an integer column would.
    pub fn subscription_id(&self) -> Result<i64, ValidationError> {
        let missing = ValidationError::Missing {
            field: "subscription_id",
        };
        let invalid = ValidationError::InvalidFormat {
            field: "subscription_id",
            reason: "must be an integer",
        };

        let id = match &self.subscription_id {
            None | Some(IdInput::Flag(false)) => return Err(missing),
            Some(IdInput::Flag(true)) => return Err(invalid),
            Some(IdInput::Number(n)) => number_to_id(n),
            Some(IdInput::Text(t)) if t.is_empty() => return Err(missing),
            Some(IdInput::Text(t)) => t.trim().parse::<i64>().ok(),
        };

        match id {
            Some(0) => Err(missing),
            Some(id) => Ok(id),
            None => Err(invalid),
        }
    }
}

fn number_to_id(n: &serde_json::Number) -> Option<i64> {
    if let Some(id) = n.as_i64() {
        return Some(id);
    }
    let f = n.as_f64()?;
    // Integral floats only; i64::MAX as f64 rounds up, hence the strict bound
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

/// One entry of a user's link listing
#[derive(Debug, Serialize)]
pub struct UserSubscriptionResponse {
    pub subscription_id: i64,
    /// `None` when the plan row no longer exists
    pub subscription_name: Option<String>,
    pub status: SubscriptionStatus,
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /users/{id}/subscriptions
///
/// An unknown user simply has no links.
async fn list_user_subscriptions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<UserSubscriptionResponse>>, ApiError> {
    let mut session = state.db.open_session().await?;
    let links = session.links_for_user(user_id).await?;

    let mut result = Vec::with_capacity(links.len());
    for link in links {
        let plan = session.find_plan(link.subscription_id).await?;
        result.push(UserSubscriptionResponse {
            subscription_id: link.subscription_id,
            subscription_name: plan.map(|p| p.name),
            status: link.status,
            start_date: link.start_date.to_rfc3339(),
            end_date: link.end_date.map(|d| d.to_rfc3339()),
        });
    }
    session.commit().await?;

    Ok(Json(result))
}

/// POST /users/{id}/subscriptions
async fn add_user_subscription(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    body: Result<Json<AddSubscriptionRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body.map_err(|e| {
        tracing::debug!(rejection = %e.body_text(), "unreadable request body");
        ValidationError::Malformed
    })?;
    let subscription_id = req.subscription_id()?;

    let mut session = state.db.open_session().await?;
    check_can_subscribe(session.as_mut(), user_id, subscription_id).await?;

    let inserted = session
        .insert_link(NewUserSubscription::active(user_id, subscription_id))
        .await;
    let outcome = match inserted {
        Ok(_) => session.commit().await,
        Err(e) => {
            if let Err(rollback_err) = session.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed insert");
            }
            Err(e)
        }
    };
    outcome?;

    tracing::info!(user_id, subscription_id, "subscription added");
    Ok(Json(MessageResponse {
        message: "Subscription added successfully",
    }))
}

/// Existence and duplicate checks, run before any write.
async fn check_can_subscribe(
    session: &mut dyn Session,
    user_id: i64,
    subscription_id: i64,
) -> Result<(), ApiError> {
    let user = session.find_user(user_id).await?;
    let plan = session.find_plan(subscription_id).await?;
    if user.is_none() || plan.is_none() {
        return Err(ApiError::user_or_plan_not_found());
    }

    // Any existing link blocks, whatever its status
    if session.find_link(user_id, subscription_id).await?.is_some() {
        return Err(ApiError::duplicate_link());
    }

    Ok(())
}

/// Link routes
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/{id}/subscriptions",
        get(list_user_subscriptions).post(add_user_subscription),
    )
}
