//! API error types with IntoResponse
//!
//! Errors are converted to `{"error": "..."}` JSON bodies with the
//! matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    Validation(ValidationError),

    /// Referenced user or plan absent (404)
    NotFound { message: String },

    /// Link for the pair already exists (409)
    Conflict { message: String },

    /// Storage rejected the write; the unit of work was rolled back (400)
    Integrity,

    /// Database error (500, logged)
    Database(DbError),
}

impl ApiError {
    pub fn user_or_plan_not_found() -> Self {
        Self::NotFound {
            message: "User or Subscription not found".to_string(),
        }
    }

    pub fn duplicate_link() -> Self {
        Self::Conflict {
            message: "User already has this subscription".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Integrity => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Validation(e) => e.to_string(),
            Self::NotFound { message } | Self::Conflict { message } => message,
            Self::Integrity => "Integrity error".to_string(),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                "an internal error occurred".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            // The unique index caught a duplicate the pre-check missed
            DbError::UniqueViolation { .. } => Self::duplicate_link(),
            DbError::Integrity { message } => {
                tracing::warn!(%message, "write rejected by storage constraint");
                Self::Integrity
            }
            _ => Self::Database(e),
        }
    }
}
