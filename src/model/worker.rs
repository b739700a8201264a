use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_no": "LAB000042",
        "name": "Ramesh Kumar",
        "mobile_number": "+919812345678",
        "contractor_id": 3,
        "is_active": true
    })
)]
pub struct Worker {
    #[schema(example = 1)]
    pub id: u64,

    /// Device-correlated code, immutable once assigned
    #[schema(example = "LAB000042")]
    pub employee_no: String,

    #[schema(example = "Ramesh Kumar")]
    pub name: String,

    #[schema(example = "+919812345678", nullable = true)]
    pub mobile_number: Option<String>,

    #[schema(example = 3, nullable = true)]
    pub contractor_id: Option<u64>,

    #[schema(nullable = true)]
    pub fingerprint_data: Option<String>,

    #[schema(nullable = true)]
    pub photo_url: Option<String>,

    pub is_active: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
