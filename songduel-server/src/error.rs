//! Error types for the HTTP layer
//!
//! Store and ledger errors are translated here; handlers never hand a raw
//! sqlx error to the client. Store failures are logged in full and reach
//! the client only as a generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or unknown identity token (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Store failure after retries; the client may try again (500)
    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<songduel_common::Error> for ApiError {
    fn from(err: songduel_common::Error) -> Self {
        use songduel_common::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) | Error::Unavailable(msg) => {
                warn!(error = %msg, "Store busy, vote not recorded");
                ApiError::Unavailable("The vote could not be recorded.".to_string())
            }
            other => {
                error!(error = %other, "Unhandled store error");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Unavailable(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RETRYABLE",
                format!("{} Please try again.", msg),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use songduel_common::Error;

    #[test]
    fn test_common_errors_map_to_status() {
        let cases = [
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (Error::Unavailable("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    async fn body_text(err: Error) -> String {
        let response = ApiError::from(err).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_store_details_are_not_exposed() {
        let body = body_text(Error::Database(sqlx::Error::Protocol(
            "no such table: songs".to_string(),
        )))
        .await;
        assert!(body.contains("INTERNAL_ERROR"));
        assert!(!body.contains("no such table"));
        assert!(!body.contains("Database error"));

        let body = body_text(Error::Unavailable(
            "like failed after 3 attempts: Database error: database is locked".to_string(),
        ))
        .await;
        assert!(body.contains("RETRYABLE"));
        assert!(body.contains("Please try again."));
        assert!(!body.contains("database is locked"));
    }

    #[tokio::test]
    async fn test_client_errors_keep_their_message() {
        let body = body_text(Error::NotFound("Song not found: a".to_string())).await;
        assert!(body.contains("Song not found: a"));
    }
}
