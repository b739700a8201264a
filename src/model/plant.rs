use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Plant {
    pub id: u64,
    #[schema(example = "Unit 2 - Ranjangaon")]
    pub name: String,
    #[schema(nullable = true)]
    pub location: Option<String>,
    #[schema(example = 500, nullable = true)]
    pub capacity: Option<u32>,
}
