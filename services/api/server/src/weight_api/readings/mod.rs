pub mod errors;
pub mod recent;
pub mod record;
pub mod weight;

use serde::Serialize;
use utoipa::ToSchema;

/// `status` field of a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SuccessStatus {
    Success,
}
