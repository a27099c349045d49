use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures reported by a row store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Sheet not found: {0}")]
    NotFound(String),

    #[error("Malformed row data: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(std::io::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => StoreError::PermissionDenied(err.to_string()),
            _ => StoreError::Io(err),
        }
    }
}

/// Everything a submission or a dashboard read can fail with
#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unknown feedback category: {0}")]
    UnknownCategory(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(feature = "web")]
mod response {
    use super::{FeedbackError, StoreError};
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use serde_json::json;

    impl IntoResponse for FeedbackError {
        fn into_response(self) -> Response {
            match self {
                FeedbackError::Validation(errors) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "status": "error",
                        "message": errors.first().map(|e| format!("{}: {}", e.field, e.message)),
                        "errors": errors,
                    })),
                )
                    .into_response(),
                FeedbackError::Configuration(detail) => {
                    log::error!("Store misconfigured: {detail}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({ "status": "error", "message": "Service unavailable" })),
                    )
                        .into_response()
                }
                FeedbackError::Store(err) => {
                    log::error!("Row store failure: {err}");
                    let message = match err {
                        StoreError::PermissionDenied(_) => "Feedback store refused the request",
                        StoreError::NotFound(_) => "Feedback sheet not found",
                        _ => "Could not reach the feedback store",
                    };
                    (
                        StatusCode::BAD_GATEWAY,
                        Json(json!({ "status": "error", "message": message })),
                    )
                        .into_response()
                }
                FeedbackError::UnknownCategory(tag) => (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "status": "error",
                        "message": format!("Unknown feedback category: {tag}"),
                    })),
                )
                    .into_response(),
            }
        }
    }
}
