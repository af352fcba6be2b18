use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use trekdesk_booking::{CancellationError, IntakeError};
use trekdesk_catalog::BatchAdminError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    /// The booking backend failed; the admin may retry the action
    BackendError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::BackendError(msg) => {
                tracing::error!("Booking backend error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Booking backend unavailable, please try again".to_string())
            },
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BatchAdminError> for AppError {
    fn from(err: BatchAdminError) -> Self {
        match err {
            BatchAdminError::NotFound { .. } => AppError::NotFoundError(err.to_string()),
            BatchAdminError::Validation(e) => AppError::ValidationError(e.to_string()),
            BatchAdminError::Backend(msg) => AppError::BackendError(msg),
        }
    }
}

impl From<CancellationError> for AppError {
    fn from(err: CancellationError) -> Self {
        match err {
            CancellationError::BookingNotFound(_) | CancellationError::BatchNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            CancellationError::AlreadyCancelled(_) => AppError::ConflictError(err.to_string()),
            CancellationError::Refund(e) => AppError::ValidationError(e.to_string()),
            CancellationError::Backend(msg) => AppError::BackendError(msg),
        }
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Validation(msg) => AppError::ValidationError(msg),
            IntakeError::WrongStep { .. } | IntakeError::Completed | IntakeError::AtFirstStep => {
                AppError::ConflictError(err.to_string())
            }
            IntakeError::BatchNotFound(_) => AppError::NotFoundError(err.to_string()),
            IntakeError::Backend(msg) => AppError::BackendError(msg),
        }
    }
}
