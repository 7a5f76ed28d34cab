use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pinhole_core::{ShortenerError, StorageError};
use tracing::{error, warn};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Engine(ShortenerError),
    /// The stored target cannot be sent as a `Location` header.
    InvalidLocation(String),
}

impl From<ShortenerError> for AppError {
    fn from(err: ShortenerError) -> Self {
        AppError::Engine(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Engine(err) => match err {
                ShortenerError::InvalidUrl(_) | ShortenerError::InvalidShortCode(_) => {
                    StatusCode::BAD_REQUEST
                }
                ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
                ShortenerError::AliasConflict(_) => StatusCode::CONFLICT,
                ShortenerError::Exhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ShortenerError::Storage(StorageError::Unavailable(_) | StorageError::Timeout(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                ShortenerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::InvalidLocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Engine(err) => err.to_string(),
            AppError::InvalidLocation(code) => {
                format!("target of '{code}' is not a valid redirect location")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else if status == StatusCode::CONFLICT {
            warn!(error = %message, "request conflicted");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
