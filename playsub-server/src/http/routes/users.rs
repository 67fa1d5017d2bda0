//! User endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::User;

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
        }
    }
}

/// GET /users - list every user
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let mut session = state.db.open_session().await?;
    let users = session.list_users().await?;
    session.commit().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}
