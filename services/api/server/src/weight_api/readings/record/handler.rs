use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use sqlite_models::connection::with_connection;
use sqlite_models::models::readings::{NewReading, Reading};

use crate::AppState;
use crate::shared::errors::ApiError;
use crate::shared::extractors::input::RequestInput;
use crate::shared::extractors::request_id::RequestId;
use crate::weight_api::error_recorder::ErrorRecorder;

use super::super::SuccessStatus;
use super::super::errors::{self, HandlerResult};
use super::super::weight::parse_weight;
use super::models::RecordReadingResponse;

const HANDLER_NAME: &str = "record_reading";

/// Store a weight reading
///
/// Accepts `weight`, `api_key` and `esp_token` from a JSON or urlencoded
/// body, or from the query string. Either a valid `api_key` or, when no
/// `api_key` is given, a valid `esp_token` is required.
#[utoipa::path(
    method(get, post),
    path = "/api/weight",
    params(
        ("weight" = Option<String>, Query, description = "Weight reading, a non-negative number"),
        ("api_key" = Option<String>, Query, description = "Operator API key"),
        ("esp_token" = Option<String>, Query, description = "Device token, checked only without api_key"),
    ),
    responses(
        (status = 200, description = "Reading stored", body = RecordReadingResponse),
        (status = 400, description = "Invalid weight"),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Database insert failed"),
    ),
    tag = "readings",
)]
#[tracing::instrument(skip_all, name = "record_reading")]
pub async fn handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    input: RequestInput,
) -> HandlerResult<(StatusCode, Json<RecordReadingResponse>)> {
    let recorder =
        ErrorRecorder::new(&state.telemetry, HANDLER_NAME, &request_id);

    if !input.credentials().authorize(&state.config.secrets()) {
        return Err(recorder.record(errors::Error::Unauthorized));
    }

    let weight =
        parse_weight(input.field("weight"), state.config.weight_parse_mode())
            .map_err(|e| recorder.record(errors::Error::InvalidWeight(e)))?;

    let reading = with_connection(&state.db, |conn| {
        Box::pin(Reading::create(NewReading { weight }, conn))
    })
    .await
    .map_err(|e| recorder.record(errors::Error::InsertFailed(e)))?;

    state.telemetry.maybe_use_metrics(|m| m.record_reading());

    tracing::info!(
        id = reading.id,
        weight = reading.weight,
        request_id = %request_id,
        "Reading recorded",
    );

    Ok((
        StatusCode::OK,
        Json(RecordReadingResponse {
            status: SuccessStatus::Success,
            weight: reading.weight,
            id: reading.id,
        }),
    ))
}

/// Anything but GET and POST, whatever the credentials.
#[tracing::instrument(skip_all, name = "record_reading_method_not_allowed")]
pub async fn method_not_allowed(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
) -> ApiError {
    ErrorRecorder::new(&state.telemetry, HANDLER_NAME, &request_id)
        .record(errors::Error::MethodNotAllowed)
}
