use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// JSON error body `{"error": message}` with a status code.
/// Server-side failures carry a fixed message; the cause only goes to the log.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn storage() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save data")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => {
                warn!(error = %msg, "rejected webhook payload");
                Self::bad_request(msg)
            }
            ServiceError::Storage(cause) => {
                error!(error = %cause, "failed to save snapshot");
                Self::storage()
            }
            ServiceError::Serialization(cause) => {
                error!(error = %cause, "snapshot serialization failed");
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "unreadable webhook body");
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::bad_request("No JSON payload provided"),
            other => Self::bad_request(format!("Invalid JSON payload: {}", other.body_text())),
        }
    }
}

/// Response for a handler that panicked; installed through `CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %detail, "request handler panicked");
    ApiError::internal().into_response()
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
}
