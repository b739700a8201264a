use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Contractor {
    pub id: u64,
    #[schema(example = "CON000007")]
    pub employee_no: String,
    #[schema(example = "Shakti Engineering Works")]
    pub firm_name: String,
    pub user_id: Option<u64>,
    pub plant_id: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
