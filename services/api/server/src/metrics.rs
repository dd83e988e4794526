use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use telemetry::metrics::TelemetryMetrics;

use crate::AppState;

#[derive(Clone, Debug)]
pub struct ServerMetrics {
    pub registry: Registry,

    pub request_errors: IntCounterVec,
    pub readings_recorded: IntCounter,
}

impl TelemetryMetrics for ServerMetrics {
    fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl ServerMetrics {
    /// Metrics live in their own registry, so several instances (one per
    /// test server, for example) never collide.
    pub fn new(prefix: Option<String>) -> anyhow::Result<Self> {
        let request_errors = IntCounterVec::new(
            Opts::new(
                "request_errors",
                "A metric counting request errors by handler and error code",
            ),
            &["handler", "error_code"],
        )?;

        let readings_recorded = IntCounter::with_opts(Opts::new(
            "readings_recorded",
            "A metric counting weight readings stored",
        ))?;

        let registry = Registry::new_custom(prefix, None)?;
        registry.register(Box::new(request_errors.clone()))?;
        registry.register(Box::new(readings_recorded.clone()))?;

        Ok(Self {
            registry,
            request_errors,
            readings_recorded,
        })
    }

    pub fn record_error(&self, handler: &str, error_code: &str) {
        self.request_errors
            .with_label_values(&[handler, error_code])
            .inc();
    }

    pub fn record_reading(&self) {
        self.readings_recorded.inc();
    }
}

pub async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.telemetry.get_metrics().await,
    )
}
