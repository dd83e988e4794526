use utoipa::OpenApi;

/// Main OpenAPI documentation for the weight API
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::weight_api::readings::record::handler::handler,
        crate::weight_api::readings::recent::handler::handler,
    ),
    info(
        title = "Weight Telemetry API",
        version = "1.0.0",
        description = "Ingests weight readings from ESP32 scales and serves the most recent ones",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "readings", description = "Weight readings ingestion and retrieval")
    )
)]
pub struct WeightApiDoc;

impl WeightApiDoc {
    pub fn openapi() -> utoipa::openapi::OpenApi {
        <WeightApiDoc as utoipa::OpenApi>::openapi()
    }
}
