use std::sync::Arc;

use crate::{
    auth::auth::AuthUser,
    device::DeviceClient,
    model::contractor::Contractor,
    reconcile::CivilClock,
    utils::{
        codes,
        db_utils::{build_update_sql, execute_update},
    },
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{error, warn};
use utoipa::ToSchema;

const UPDATABLE_COLUMNS: &[&str] = &["firm_name", "user_id", "plant_id"];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateContractor {
    #[schema(example = "Shakti Engineering Works")]
    pub firm_name: String,
    pub user_id: Option<u64>,
    pub plant_id: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContractorQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub plant_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ContractorListResponse {
    pub data: Vec<Contractor>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Create Contractor
#[utoipa::path(
    post,
    path = "/api/v1/contractors",
    request_body = CreateContractor,
    responses(
        (status = 201, description = "Contractor created", body = Object, example = json!({
            "message": "Contractor created successfully",
            "employee_no": "CON000007"
        })),
        (status = 502, description = "Device rejected the enrolment")
    ),
    tag = "Contractor",
    security(("bearer_auth" = []))
)]
pub async fn create_contractor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    device: web::Data<Arc<DeviceClient>>,
    clock: web::Data<CivilClock>,
    payload: web::Json<CreateContractor>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if payload.firm_name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Firm name is required"
        })));
    }

    let employee_no = codes::next_code(pool.get_ref(), "CONTRACTOR")
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to claim contractor employee code");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if let Err(e) = device
        .enroll_user(&employee_no, payload.firm_name.trim(), clock.today())
        .await
    {
        error!(error = %e, %employee_no, "Device enrolment failed");
        return Ok(HttpResponse::BadGateway().json(json!({
            "message": "Failed to add user to camera system"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO contractors (employee_no, firm_name, user_id, plant_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&employee_no)
    .bind(payload.firm_name.trim())
    .bind(payload.user_id)
    .bind(payload.plant_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Contractor created successfully",
            "employee_no": employee_no
        }))),
        Err(e) => {
            error!(error = %e, %employee_no, "Failed to create contractor");
            if let Err(e) = device.remove_user(&employee_no).await {
                warn!(error = %e, %employee_no, "Could not undo device enrolment");
            }
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/contractors",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("plant_id", Query, description = "Filter by plant")
    ),
    responses(
        (status = 200, description = "Paginated contractor list", body = ContractorListResponse)
    ),
    tag = "Contractor",
    security(("bearer_auth" = []))
)]
pub async fn list_contractors(
    pool: web::Data<MySqlPool>,
    query: web::Query<ContractorQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let (where_clause, plant_bind) = match query.plant_id {
        Some(id) => ("WHERE plant_id = ?", Some(id)),
        None => ("", None),
    };

    let count_sql = format!("SELECT COUNT(*) FROM contractors {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(id) = plant_bind {
        count_query = count_query.bind(id);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count contractors");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        "SELECT * FROM contractors {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut data_query = sqlx::query_as::<_, Contractor>(&data_sql);
    if let Some(id) = plant_bind {
        data_query = data_query.bind(id);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let contractors = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch contractors");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(ContractorListResponse {
        data: contractors,
        page,
        per_page,
        total,
    }))
}

/// Get Contractor by ID
#[utoipa::path(
    get,
    path = "/api/v1/contractors/{contractor_id}",
    params(("contractor_id", Path, description = "Contractor ID")),
    responses(
        (status = 200, description = "Contractor found", body = Contractor),
        (status = 404, description = "Contractor not found")
    ),
    tag = "Contractor",
    security(("bearer_auth" = []))
)]
pub async fn get_contractor(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let contractor_id = path.into_inner();

    let contractor = sqlx::query_as::<_, Contractor>("SELECT * FROM contractors WHERE id = ?")
        .bind(contractor_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, contractor_id, "Failed to fetch contractor");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match contractor {
        Some(c) => Ok(HttpResponse::Ok().json(c)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Contractor not found"
        }))),
    }
}

/// Update Contractor (employee_no is immutable)
#[utoipa::path(
    put,
    path = "/api/v1/contractors/{contractor_id}",
    params(("contractor_id", Path, description = "Contractor ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Contractor updated"),
        (status = 404, description = "Contractor not found")
    ),
    tag = "Contractor",
    security(("bearer_auth" = []))
)]
pub async fn update_contractor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let contractor_id = path.into_inner();

    let update = build_update_sql("contractors", &body, UPDATABLE_COLUMNS, "id", contractor_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Contractor not found"));
    }

    Ok(HttpResponse::Ok().body("Contractor updated successfully"))
}

/// Delete Contractor
#[utoipa::path(
    delete,
    path = "/api/v1/contractors/{contractor_id}",
    params(("contractor_id", Path, description = "Contractor ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 400, description = "Contractor still has workers"),
        (status = 404, description = "Contractor not found")
    ),
    tag = "Contractor",
    security(("bearer_auth" = []))
)]
pub async fn delete_contractor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    device: web::Data<Arc<DeviceClient>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let contractor_id = path.into_inner();

    let workers = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM workers WHERE contractor_id = ?",
    )
    .bind(contractor_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    if workers > 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot delete contractor with assigned workers"
        })));
    }

    let employee_no = sqlx::query_scalar::<_, String>(
        "SELECT employee_no FROM contractors WHERE id = ?",
    )
    .bind(contractor_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let employee_no = match employee_no {
        Some(no) => no,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Contractor not found"
            })));
        }
    };

    sqlx::query("DELETE FROM contractors WHERE id = ?")
        .bind(contractor_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, contractor_id, "Failed to delete contractor");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if let Err(e) = device.remove_user(&employee_no).await {
        warn!(error = %e, %employee_no, "Device user removal failed");
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
