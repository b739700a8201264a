use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Visitor {
    pub id: u64,
    #[schema(example = "VIS-3F9A21BC")]
    pub ticket_id: String,
    pub name: String,
    pub email: String,
    pub contact: String,
    #[schema(nullable = true)]
    pub company_name: Option<String>,
    #[schema(nullable = true)]
    pub visit_purpose: Option<String>,
    #[schema(nullable = true)]
    pub meeting_with: Option<String>,
    pub plant_id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub visit_date: NaiveDate,
    /// PENDING / APPROVED / REJECTED
    #[schema(example = "PENDING")]
    pub status: String,
    #[schema(nullable = true)]
    pub remarks: Option<String>,
    pub approved_by: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub request_time: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct VisitorEntry {
    pub id: u64,
    pub visitor_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date_of_visit: NaiveDate,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub entry_time: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub exit_time: Option<NaiveDateTime>,
}
