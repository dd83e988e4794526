use serde::Serialize;
use utoipa::ToSchema;

use super::super::SuccessStatus;

/// Response to a stored reading
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordReadingResponse {
    pub status: SuccessStatus,
    /// The weight as parsed and stored
    #[schema(example = 12.5)]
    pub weight: f64,
    /// Identity assigned by the store
    #[schema(example = 42)]
    pub id: i64,
}
