use crate::{auth::auth::AuthUser, model::system_code::SystemCode};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateSystemCode {
    #[schema(example = "LAB")]
    pub prefix: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/system-codes",
    responses((status = 200, description = "All code sequences", body = [SystemCode])),
    tag = "SystemCode",
    security(("bearer_auth" = []))
)]
pub async fn list_system_codes(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let codes = sqlx::query_as::<_, SystemCode>(
        "SELECT id, module_type, prefix, last_number FROM system_codes ORDER BY module_type",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch system codes");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(codes))
}

/// Set the code prefix for a module type (creates the sequence if missing)
#[utoipa::path(
    put,
    path = "/api/v1/system-codes/{module_type}",
    params(("module_type", Path, description = "LABOUR, CONTRACTOR, ...")),
    request_body = UpdateSystemCode,
    responses(
        (status = 200, description = "Prefix updated"),
        (status = 400, description = "Prefix is required")
    ),
    tag = "SystemCode",
    security(("bearer_auth" = []))
)]
pub async fn update_system_code(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<UpdateSystemCode>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let module_type = path.into_inner().to_uppercase();
    let prefix = payload.prefix.trim();

    if prefix.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Prefix is required"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO system_codes (module_type, prefix, last_number)
        VALUES (?, ?, 0)
        ON DUPLICATE KEY UPDATE prefix = VALUES(prefix)
        "#,
    )
    .bind(&module_type)
    .bind(prefix)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, %module_type, "Failed to update system code");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "System code updated",
        "module_type": module_type,
        "prefix": prefix
    })))
}
