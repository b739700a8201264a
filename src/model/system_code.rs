use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-module employee-code sequence: codes are `prefix` + zero-padded counter.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SystemCode {
    pub id: u64,
    /// LABOUR, CONTRACTOR, ...
    #[schema(example = "LABOUR")]
    pub module_type: String,
    #[schema(example = "LAB")]
    pub prefix: String,
    #[schema(example = 42)]
    pub last_number: u64,
}
