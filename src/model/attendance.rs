use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per (worker, calendar day). Written only by the reconciler.
///
/// `first_in` is authoritative once set; `last_out` only ever moves forward.
/// A row with both timestamps null is an absence marker (`working_hours` 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 10,
        "worker_id": 1,
        "date": "2025-03-14",
        "first_in": "2025-03-14T08:15:00",
        "last_out": "2025-03-14T17:45:00",
        "working_hours": 9.5
    })
)]
pub struct DailyAttendance {
    pub id: u64,
    pub worker_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub first_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub last_out: Option<NaiveDateTime>,
    #[schema(example = 9.5)]
    pub working_hours: f64,
}
