use serde::Serialize;
use utoipa::ToSchema;

use super::super::SuccessStatus;

/// A single stored reading
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReadingEntry {
    pub id: i64,
    pub weight: f64,
    /// UTC, `YYYY-MM-DD HH:MM:SS`
    #[schema(example = "2026-01-01 12:00:00")]
    pub created_at: String,
}

/// Most recent readings, newest first
#[derive(Debug, Serialize, ToSchema)]
pub struct RecentReadingsResponse {
    pub status: SuccessStatus,
    pub count: usize,
    pub data: Vec<ReadingEntry>,
}
