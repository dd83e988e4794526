use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use sqlite_models::connection::with_connection;
use sqlite_models::models::readings::Reading;

use crate::AppState;
use crate::shared::errors::ApiError;
use crate::shared::extractors::input::RequestInput;
use crate::shared::extractors::request_id::RequestId;
use crate::weight_api::error_recorder::ErrorRecorder;

use super::super::SuccessStatus;
use super::super::errors::{self, HandlerResult};
use super::models::{ReadingEntry, RecentReadingsResponse};

const HANDLER_NAME: &str = "recent_readings";
pub const RECENT_LIMIT: i64 = 100;

/// Get the most recent readings
///
/// Returns at most 100 readings ordered by id, newest first.
#[utoipa::path(
    get,
    path = "/api/data",
    params(
        ("api_key" = Option<String>, Query, description = "Operator API key"),
        ("esp_token" = Option<String>, Query, description = "Device token, checked only without api_key"),
    ),
    responses(
        (status = 200, description = "Most recent readings", body = RecentReadingsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Database read failed"),
    ),
    tag = "readings",
)]
#[tracing::instrument(skip_all, name = "recent_readings")]
pub async fn handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    input: RequestInput,
) -> HandlerResult<(StatusCode, Json<RecentReadingsResponse>)> {
    let recorder =
        ErrorRecorder::new(&state.telemetry, HANDLER_NAME, &request_id);

    if !input.credentials().authorize(&state.config.secrets()) {
        return Err(recorder.record(errors::Error::Unauthorized));
    }

    let readings = with_connection(&state.db, |conn| {
        Box::pin(Reading::get_latest(RECENT_LIMIT, conn))
    })
    .await
    .map_err(|e| recorder.record(errors::Error::ReadFailed(e)))?;

    let data: Vec<ReadingEntry> = readings
        .into_iter()
        .map(|r| ReadingEntry {
            id: r.id,
            weight: r.weight,
            created_at: r.created_at,
        })
        .collect();

    tracing::debug!(count = data.len(), request_id = %request_id, "Readings served");

    Ok((
        StatusCode::OK,
        Json(RecentReadingsResponse {
            status: SuccessStatus::Success,
            count: data.len(),
            data,
        }),
    ))
}

#[tracing::instrument(skip_all, name = "recent_readings_method_not_allowed")]
pub async fn method_not_allowed(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
) -> ApiError {
    ErrorRecorder::new(&state.telemetry, HANDLER_NAME, &request_id)
        .record(errors::Error::MethodNotAllowed)
}
