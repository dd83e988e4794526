use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Error envelope returned by every endpoint: `{"status":"error","message":...}`.
///
/// The status code and the machine-readable code stay out of the body; the
/// message never carries internal detail.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status_code: StatusCode,
    #[serde(skip)]
    pub code: &'static str,
    pub status: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(
        status_code: StatusCode,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            code,
            status: "error",
            message: message.into(),
        }
    }

    pub fn report_if_server_error(&self) {
        if self.status_code.is_server_error() {
            sentry::Hub::with_active(|hub| hub.capture_error(self));
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.report_if_server_error();

        (self.status_code, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status_code, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Standard error codes, also used as the `error_code` metric label.
pub mod codes {
    pub const METHOD_NOT_ALLOWED: &str = "method_not_allowed";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const DATABASE_ERROR: &str = "database_error";
}
