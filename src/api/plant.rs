use crate::{
    auth::auth::AuthUser,
    model::plant::Plant,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

const UPDATABLE_COLUMNS: &[&str] = &["name", "location", "capacity"];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreatePlant {
    #[schema(example = "Unit 2 - Ranjangaon")]
    pub name: String,
    pub location: Option<String>,
    pub capacity: Option<u32>,
}

/// Create Plant
#[utoipa::path(
    post,
    path = "/api/v1/plants",
    request_body = CreatePlant,
    responses(
        (status = 201, description = "Plant created"),
        (status = 400, description = "Missing name")
    ),
    tag = "Plant",
    security(("bearer_auth" = []))
)]
pub async fn create_plant(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePlant>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Plant name is required"
        })));
    }

    sqlx::query("INSERT INTO plants (name, location, capacity) VALUES (?, ?, ?)")
        .bind(payload.name.trim())
        .bind(&payload.location)
        .bind(payload.capacity)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create plant");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Plant created successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/plants",
    responses(
        (status = 200, description = "All plants", body = [Plant])
    ),
    tag = "Plant",
    security(("bearer_auth" = []))
)]
pub async fn list_plants(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let plants = sqlx::query_as::<_, Plant>("SELECT * FROM plants ORDER BY name ASC")
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch plants");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(plants))
}

#[utoipa::path(
    get,
    path = "/api/v1/plants/{plant_id}",
    params(("plant_id", Path, description = "Plant ID")),
    responses(
        (status = 200, description = "Plant found", body = Plant),
        (status = 404, description = "Plant not found")
    ),
    tag = "Plant",
    security(("bearer_auth" = []))
)]
pub async fn get_plant(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let plant_id = path.into_inner();

    let plant = sqlx::query_as::<_, Plant>("SELECT * FROM plants WHERE id = ?")
        .bind(plant_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

    match plant {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Plant not found"
        }))),
    }
}

/// Update Plant
#[utoipa::path(
    put,
    path = "/api/v1/plants/{plant_id}",
    params(("plant_id", Path, description = "Plant ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Plant updated"),
        (status = 404, description = "Plant not found")
    ),
    tag = "Plant",
    security(("bearer_auth" = []))
)]
pub async fn update_plant(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let plant_id = path.into_inner();

    let update = build_update_sql("plants", &body, UPDATABLE_COLUMNS, "id", plant_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Plant not found"));
    }

    Ok(HttpResponse::Ok().body("Plant updated successfully"))
}

/// Delete Plant
#[utoipa::path(
    delete,
    path = "/api/v1/plants/{plant_id}",
    params(("plant_id", Path, description = "Plant ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Plant not found")
    ),
    tag = "Plant",
    security(("bearer_auth" = []))
)]
pub async fn delete_plant(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let plant_id = path.into_inner();

    let result = sqlx::query("DELETE FROM plants WHERE id = ?")
        .bind(plant_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, plant_id, "Failed to delete plant");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Plant not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
