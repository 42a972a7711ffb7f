use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, platform::PlatformError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The record file could not be loaded or persisted.
    #[error("record storage failed")]
    Storage(#[from] StorageError),
    /// A call to the chat platform failed.
    #[error("chat platform call failed")]
    Platform(#[from] PlatformError),
    /// Invalid input provided by the invoking user.
    #[error("{0}")]
    InvalidInput(String),
    /// Another mutating command holds the record store.
    #[error("the record store is busy")]
    Busy,
    /// The invoking user may not modify the list.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The command is restricted to the bot owner.
    #[error("command restricted to the bot owner")]
    NotOwner,
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
