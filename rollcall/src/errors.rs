use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::types::Role;

/// Result type for scheduling operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the scheduling system.
///
/// Every business-rule failure is converted to one of these at the operation
/// boundary; only genuine infrastructure failures travel as `Database`.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input. Caller-correctable, never retried.
    #[error("{0}")]
    Validation(String),

    /// A referenced template/instance/reservation does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// A scheduling conflict was detected deterministically.
    #[error("{0}")]
    Conflict(String),

    /// A business rule was violated (class full, lead time, already cancelled).
    #[error("{0}")]
    InvalidOperation(String),

    /// The transaction was repeatedly aborted by concurrent updates.
    #[error("operation aborted by concurrent updates, please try again")]
    Retry,

    /// No identity headers were forwarded with the request.
    #[error("authentication required")]
    Unauthorized,

    /// The forwarded identity lacks the required role.
    #[error("{0} role required")]
    Forbidden(Role),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invariant violation inside the service itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::InvalidOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Retry => StatusCode::SERVICE_UNAVAILABLE,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let message = match &self {
            // Don't leak driver details to clients.
            Error::Database(_) | Error::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
