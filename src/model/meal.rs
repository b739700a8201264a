use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Meal {
    pub id: u64,
    #[schema(example = "Veg Thali")]
    pub name: String,
    #[schema(example = 80.0)]
    pub price: f64,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MealRequest {
    pub id: u64,
    #[schema(example = "MEAL-7C01D9AF")]
    pub ticket_id: String,
    pub meal_id: u64,
    pub user_id: u64,
    pub plant_id: Option<u64>,
    pub quantity: u32,
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
pub struct MealEntry {
    pub id: u64,
    pub meal_request_id: u64,
    pub plant_id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub date_of_meal: NaiveDate,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub serve_time: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub consume_time: Option<NaiveDateTime>,
}
