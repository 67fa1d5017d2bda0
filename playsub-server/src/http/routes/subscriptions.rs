//! Plan catalogue endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::Plan;

/// Plan response
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

impl From<Plan> for PlanResponse {
    fn from(p: Plan) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            description: p.description,
        }
    }
}

/// GET /subscriptions - list every plan
async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<PlanResponse>>, ApiError> {
    let mut session = state.db.open_session().await?;
    let plans = session.list_plans().await?;
    session.commit().await?;

    Ok(Json(plans.into_iter().map(PlanResponse::from).collect()))
}

/// Plan routes
pub fn router() -> Router<AppState> {
    Router::new().route("/subscriptions", get(list_plans))
}
