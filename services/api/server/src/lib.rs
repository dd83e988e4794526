//! # Weight API Server
//!
//! Ingests weight readings reported by ESP32 scales and serves the most
//! recent ones back to operators.
use crate::metrics::ServerMetrics;
use crate::shared::auth::Secrets;
use crate::shared::errors::ApiError;
use crate::shutdown::ShutdownCoordinator;
use axum::Json;
use axum::routing::get;
use serde_json::json;
use sqlite_models::connection::Database;
use std::sync::Arc;
use telemetry::metrics::Telemetry;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    trace::TraceLayer,
};

pub mod shutdown;
mod weight_api;

// OpenAPI documentation module
pub mod openapi;

// Public modules - shared utilities and middleware
pub mod health;
pub mod metrics;
pub mod shared;

pub use weight_api::get_routes as get_weight_api_routes;
pub use weight_api::readings::recent::handler::RECENT_LIMIT;
pub use weight_api::readings::weight::{ParseMode, WeightError, parse_weight};

pub const VERSION: Option<&'static str> = option_env!("VERSION");

/// Returns the OpenAPI document route for the weight API.
pub fn get_openapi_routes() -> axum::Router {
    async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
        Json(openapi::WeightApiDoc::openapi())
    }

    axum::Router::new().route("/api-docs/openapi.json", get(openapi_handler))
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn fallback_handler() -> ApiError {
    shared::errors::not_found("not found")
}

/// Builds the complete service router: liveness, health, version, metrics,
/// the `/api` readings endpoints and the OpenAPI document.
pub fn router(app_state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health::handler))
        .route("/version", get(|| async { VERSION.unwrap_or("unknown") }))
        .route("/metrics", get(metrics::handler))
        .with_state(app_state.clone())
        .nest("/api", get_weight_api_routes(app_state))
        .fallback(fallback_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::new())
        .merge(get_openapi_routes())
}

#[derive(Clone)]
pub struct AppState {
    pub telemetry: Arc<Telemetry<ServerMetrics>>,
    pub db: Database,
    pub config: Arc<Config>,
    pub shutdown: Arc<ShutdownCoordinator>,
}

impl axum::extract::FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("{0} must not be empty")]
    EmptySecret(&'static str),
}

#[derive(serde::Deserialize)]
pub struct Config {
    // Service port
    #[serde(default = "default_port")]
    pub port: u16,

    // Shared secrets for operators and devices
    pub api_key: String,
    pub esp_token: String,

    // Loggers
    #[serde(default)]
    pub rust_log: String,
    #[serde(default)]
    pub log_format: String,

    // Sqlite file, created on first run
    #[serde(default = "default_database_url")]
    pub database_url: String,

    // Reject weights with trailing garbage such as "12.5kg"
    #[serde(default)]
    pub strict_weight: bool,

    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "data.db".to_string()
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (useful when running outside docker-compose)
        match dotenv::dotenv() {
            Ok(path) => eprintln!("Loaded .env from: {}", path.display()),
            Err(e) => eprintln!("dotenv warning: {e}"),
        }

        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration with the given secrets and defaults everywhere else.
    pub fn with_secrets(
        api_key: impl Into<String>,
        esp_token: impl Into<String>,
    ) -> Self {
        Self {
            port: default_port(),
            api_key: api_key.into(),
            esp_token: esp_token.into(),
            rust_log: String::new(),
            log_format: String::new(),
            database_url: default_database_url(),
            strict_weight: false,
            sentry_dsn: None,
        }
    }

    /// An empty secret would let a request without credentials through.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::EmptySecret("API_KEY"));
        }
        if self.esp_token.is_empty() {
            return Err(ConfigError::EmptySecret("ESP_TOKEN"));
        }
        Ok(())
    }

    pub fn secrets(&self) -> Secrets<'_> {
        Secrets {
            api_key: &self.api_key,
            esp_token: &self.esp_token,
        }
    }

    pub fn weight_parse_mode(&self) -> ParseMode {
        if self.strict_weight {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }
}
