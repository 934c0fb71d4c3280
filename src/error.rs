//! Application error taxonomy mapped onto stable HTTP statuses.
//!
//! Engine errors are always surfaced to the caller as 400s; post-commit
//! side effects never produce errors here (they are logged and dropped).

use crate::game::GameError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Malformed input: bad body, unknown action, invalid name. 400
    Validation(String),
    /// Missing or invalid bearer token. 401
    Unauthorized,
    /// Banned agent or admin-key mismatch. 403
    Forbidden(String),
    /// Unique-name collision. 409
    Conflict(String),
    /// A legal request the current state refuses (engine errors land
    /// here too). 400
    Precondition(String),
    /// Sliding window exceeded; carries the retry hint in seconds. 429
    RateLimited { retry_after: u64 },
    /// Unknown table or resource. 404
    NotFound(String),
    /// Anything unexpected. 500
    Internal(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Precondition(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::Precondition(msg)
            | AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::Unauthorized => json!({ "error": "Unauthorized" }),
            AppError::RateLimited { retry_after } => json!({
                "error": "Rate limit exceeded",
                "retryAfter": retry_after,
            }),
            AppError::Internal(err) => {
                tracing::error!("Internal error: {err:#}");
                json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        AppError::Precondition(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // A UNIQUE violation is how concurrent registrations lose the race.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.message().contains("UNIQUE constraint failed") {
                return AppError::Conflict("Name already taken".to_string());
            }
        }
        AppError::Internal(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameError;

    #[test]
    fn engine_errors_map_to_bad_request() {
        let app_err: AppError = GameError::NotYourTurn.into();
        assert_eq!(app_err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Conflict("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::RateLimited { retry_after: 30 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
