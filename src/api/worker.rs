use std::sync::Arc;

use crate::{
    auth::auth::AuthUser,
    device::DeviceClient,
    model::worker::Worker,
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
use tracing::{debug, error, warn};
use utoipa::ToSchema;

const UPDATABLE_COLUMNS: &[&str] = &[
    "name",
    "mobile_number",
    "contractor_id",
    "fingerprint_data",
    "photo_url",
    "is_active",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateWorker {
    #[schema(example = "Ramesh Kumar")]
    pub name: String,
    #[schema(example = "+919812345678")]
    pub mobile_number: Option<String>,
    #[schema(example = 3)]
    pub contractor_id: Option<u64>,
    pub fingerprint_data: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkerQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub contractor_id: Option<u64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkerListResponse {
    pub data: Vec<Worker>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 120)]
    pub total: i64,
}

/// Create Worker
///
/// Claims the next LABOUR employee code, provisions the worker on the
/// access-control device, then persists the row.
#[utoipa::path(
    post,
    path = "/api/v1/workers",
    request_body = CreateWorker,
    responses(
        (status = 201, description = "Worker created", body = Object, example = json!({
            "message": "Worker created successfully",
            "employee_no": "LAB000042"
        })),
        (status = 502, description = "Device rejected the enrolment"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Worker",
    security(("bearer_auth" = []))
)]
pub async fn create_worker(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    device: web::Data<Arc<DeviceClient>>,
    clock: web::Data<CivilClock>,
    payload: web::Json<CreateWorker>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Worker name is required"
        })));
    }

    let employee_no = codes::next_code(pool.get_ref(), "LABOUR")
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to claim labour employee code");
            ErrorInternalServerError("Internal Server Error")
        })?;

    // Enrol on the device before committing the row; a worker the camera
    // does not know cannot badge in anyway.
    if let Err(e) = device
        .enroll_user(&employee_no, payload.name.trim(), clock.today())
        .await
    {
        error!(error = %e, %employee_no, "Device enrolment failed");
        return Ok(HttpResponse::BadGateway().json(json!({
            "message": "Failed to add user to camera system"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO workers
        (employee_no, name, mobile_number, contractor_id, fingerprint_data, photo_url, is_active)
        VALUES (?, ?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(&employee_no)
    .bind(payload.name.trim())
    .bind(&payload.mobile_number)
    .bind(payload.contractor_id)
    .bind(&payload.fingerprint_data)
    .bind(&payload.photo_url)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Worker created successfully",
            "employee_no": employee_no
        }))),
        Err(e) => {
            error!(error = %e, %employee_no, "Failed to create worker");
            // roll the device enrolment back so the code is not left dangling
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
    path = "/api/v1/workers",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("contractor_id", Query, description = "Filter by contractor"),
        ("is_active", Query, description = "Filter by active flag"),
        ("search", Query, description = "Search by name or employee code")
    ),
    responses(
        (status = 200, description = "Paginated worker list", body = WorkerListResponse)
    ),
    tag = "Worker",
    security(("bearer_auth" = []))
)]
pub async fn list_workers(
    pool: web::Data<MySqlPool>,
    query: web::Query<WorkerQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(contractor_id) = query.contractor_id {
        conditions.push("contractor_id = ?");
        bindings.push(contractor_id.into());
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?");
        bindings.push(is_active.into());
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR employee_no LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone().into());
        bindings.push(like.into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM workers {}", where_clause);
    debug!(sql = %count_sql, "Counting workers");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count workers");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM workers {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, Worker>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let workers = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch workers");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(WorkerListResponse {
        data: workers,
        page,
        per_page,
        total,
    }))
}

/// Get Worker by ID
#[utoipa::path(
    get,
    path = "/api/v1/workers/{worker_id}",
    params(("worker_id", Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Worker found", body = Worker),
        (status = 404, description = "Worker not found")
    ),
    tag = "Worker",
    security(("bearer_auth" = []))
)]
pub async fn get_worker(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let worker_id = path.into_inner();

    let worker = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE id = ?")
        .bind(worker_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, worker_id, "Failed to fetch worker");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match worker {
        Some(w) => Ok(HttpResponse::Ok().json(w)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Worker not found"
        }))),
    }
}

/// Update Worker
///
/// `employee_no` is immutable and not accepted here. A name change is pushed
/// to the device as well.
#[utoipa::path(
    put,
    path = "/api/v1/workers/{worker_id}",
    params(("worker_id", Path, description = "Worker ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Worker updated"),
        (status = 404, description = "Worker not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Worker",
    security(("bearer_auth" = []))
)]
pub async fn update_worker(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    device: web::Data<Arc<DeviceClient>>,
    clock: web::Data<CivilClock>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let worker_id = path.into_inner();

    let update = build_update_sql("workers", &body, UPDATABLE_COLUMNS, "id", worker_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Worker not found"));
    }

    if body.get("name").is_some() {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT employee_no, name FROM workers WHERE id = ?",
        )
        .bind(worker_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

        if let Some((employee_no, name)) = row {
            if let Err(e) = device.update_user(&employee_no, &name, clock.today()).await {
                warn!(error = %e, %employee_no, "Device user update failed");
            }
        }
    }

    Ok(HttpResponse::Ok().body("Worker updated successfully"))
}

/// Delete Worker
#[utoipa::path(
    delete,
    path = "/api/v1/workers/{worker_id}",
    params(("worker_id", Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Worker not found")
    ),
    tag = "Worker",
    security(("bearer_auth" = []))
)]
pub async fn delete_worker(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    device: web::Data<Arc<DeviceClient>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let worker_id = path.into_inner();

    let employee_no = sqlx::query_scalar::<_, String>(
        "SELECT employee_no FROM workers WHERE id = ?",
    )
    .bind(worker_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, worker_id, "Failed to look up worker");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let employee_no = match employee_no {
        Some(no) => no,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Worker not found"
            })));
        }
    };

    sqlx::query("DELETE FROM workers WHERE id = ?")
        .bind(worker_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, worker_id, "Failed to delete worker");
            ErrorInternalServerError("Internal Server Error")
        })?;

    // de-provision the device; the row is already gone, so failures are
    // logged and cleaned up by the nightly sweep
    if let Err(e) = device.remove_user(&employee_no).await {
        warn!(error = %e, %employee_no, "Device user removal failed");
    }
    if let Err(e) = device.remove_face(&employee_no).await {
        warn!(error = %e, %employee_no, "Device face removal failed");
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
