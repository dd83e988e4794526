use std::sync::Arc;

use telemetry::metrics::Telemetry;
use uuid::Uuid;

use crate::metrics::ServerMetrics;
use crate::shared::errors::ApiError;

/// Trait for handler error types that can be converted to [`ApiError`].
pub trait IntoApiError: std::fmt::Display {
    /// Label used for the `error_code` metric dimension.
    fn error_code(&self) -> &'static str;

    fn into_api_error(self) -> ApiError;
}

/// Logs the failure, records error metrics and converts handler errors to
/// [`ApiError`].
pub struct ErrorRecorder<'a> {
    telemetry: &'a Arc<Telemetry<ServerMetrics>>,
    handler_name: &'a str,
    request_id: &'a Uuid,
}

impl<'a> ErrorRecorder<'a> {
    pub fn new(
        telemetry: &'a Arc<Telemetry<ServerMetrics>>,
        handler_name: &'a str,
        request_id: &'a Uuid,
    ) -> Self {
        Self {
            telemetry,
            handler_name,
            request_id,
        }
    }

    pub fn record<E: IntoApiError>(&self, e: E) -> ApiError {
        let code = e.error_code();
        self.telemetry.maybe_use_metrics(|m| {
            m.record_error(self.handler_name, code);
        });

        let detail = e.to_string();
        let api_error = e.into_api_error();
        if api_error.status_code.is_server_error() {
            tracing::error!(
                handler = self.handler_name,
                error_code = code,
                request_id = %self.request_id,
                error = %detail,
                "Request failed",
            );
        } else {
            tracing::warn!(
                handler = self.handler_name,
                error_code = code,
                request_id = %self.request_id,
                error = %detail,
                "Request rejected",
            );
        }

        api_error
    }
}
