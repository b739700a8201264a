use crate::{
    auth::auth::AuthUser,
    model::meal::{Meal, MealEntry, MealRequest},
    reconcile::CivilClock,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

fn generate_ticket_id() -> String {
    let tail = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("MEAL-{}", tail)
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateMeal {
    #[schema(example = "Veg Thali")]
    pub name: String,
    #[schema(example = 80.0)]
    pub price: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct RequestMeal {
    pub meal_id: u64,
    #[schema(example = 2)]
    pub quantity: Option<u32>,
    pub plant_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct ProcessMealRequest {
    /// APPROVED or REJECTED
    #[schema(example = "APPROVED")]
    pub status: String,
    pub remarks: Option<String>,
}

/// Create Meal
#[utoipa::path(
    post,
    path = "/api/v1/meals",
    request_body = CreateMeal,
    responses(
        (status = 201, description = "Meal created"),
        (status = 400, description = "Name and price are required")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn create_meal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateMeal>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if payload.name.trim().is_empty() || payload.price <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name and price are required"
        })));
    }

    sqlx::query("INSERT INTO meals (name, price) VALUES (?, ?)")
        .bind(payload.name.trim())
        .bind(payload.price)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create meal");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Meal created successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/meals",
    responses((status = 200, description = "All meals", body = [Meal])),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn list_meals(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let meals = sqlx::query_as::<_, Meal>("SELECT * FROM meals ORDER BY name ASC")
        .fetch_all(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(meals))
}

/// Delete Meal (refused while requests reference it)
#[utoipa::path(
    delete,
    path = "/api/v1/meals/{meal_id}",
    params(("meal_id", Path, description = "Meal ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 400, description = "Meal has existing requests"),
        (status = 404, description = "Meal not found")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn delete_meal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let meal_id = path.into_inner();

    let requests = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM meal_requests WHERE meal_id = ?",
    )
    .bind(meal_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    if requests > 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cannot delete meal with existing requests"
        })));
    }

    let result = sqlx::query("DELETE FROM meals WHERE id = ?")
        .bind(meal_id)
        .execute(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Meal not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Request a meal
#[utoipa::path(
    post,
    path = "/api/v1/meals/requests",
    request_body = RequestMeal,
    responses(
        (status = 201, description = "Meal requested", body = Object, example = json!({
            "ticket_id": "MEAL-7C01D9AF",
            "status": "PENDING"
        })),
        (status = 404, description = "Meal or plant not found")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn request_meal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RequestMeal>,
) -> actix_web::Result<impl Responder> {
    let meal_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM meals WHERE id = ?)",
    )
    .bind(payload.meal_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    if !meal_exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Meal not found"
        })));
    }

    if let Some(plant_id) = payload.plant_id {
        let plant_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM plants WHERE id = ?)",
        )
        .bind(plant_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

        if !plant_exists {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Plant not found"
            })));
        }
    }

    let ticket_id = generate_ticket_id();
    let quantity = payload.quantity.unwrap_or(1).max(1);

    sqlx::query(
        r#"
        INSERT INTO meal_requests
        (ticket_id, meal_id, user_id, plant_id, quantity, status, request_time)
        VALUES (?, ?, ?, ?, ?, 'PENDING', NOW())
        "#,
    )
    .bind(&ticket_id)
    .bind(payload.meal_id)
    .bind(auth.user_id)
    .bind(payload.plant_id)
    .bind(quantity)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create meal request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "ticket_id": ticket_id,
        "status": "PENDING"
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MealRequestQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List meal requests
#[utoipa::path(
    get,
    path = "/api/v1/meals/requests",
    params(
        ("status", Query, description = "Filter by status"),
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Paginated meal requests")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn list_meal_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MealRequestQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let (where_clause, status_bind) = match &query.status {
        Some(status) => ("WHERE status = ?", Some(status.clone())),
        None => ("", None),
    };

    let count_sql = format!("SELECT COUNT(*) FROM meal_requests {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(status) = &status_bind {
        count_query = count_query.bind(status);
    }
    let total = count_query
        .fetch_one(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

    let data_sql = format!(
        "SELECT * FROM meal_requests {} ORDER BY request_time DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut data_query = sqlx::query_as::<_, MealRequest>(&data_sql);
    if let Some(status) = &status_bind {
        data_query = data_query.bind(status);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let requests = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch meal requests");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "data": requests,
        "page": page,
        "per_page": per_page,
        "total": total
    })))
}

/// Approve or reject a meal request
#[utoipa::path(
    put,
    path = "/api/v1/meals/requests/{ticket_id}",
    params(("ticket_id", Path, description = "Meal request ticket")),
    request_body = ProcessMealRequest,
    responses(
        (status = 200, description = "Meal request processed"),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Meal request not found")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn process_meal_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<ProcessMealRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let ticket_id = path.into_inner();

    if !matches!(payload.status.as_str(), "APPROVED" | "REJECTED") {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Invalid status"
        })));
    }

    let result = sqlx::query(
        r#"
        UPDATE meal_requests
        SET status = ?, remarks = ?, approved_by = ?
        WHERE ticket_id = ?
        "#,
    )
    .bind(&payload.status)
    .bind(&payload.remarks)
    .bind(auth.user_id)
    .bind(&ticket_id)
    .execute(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Meal request not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "ticket_id": ticket_id,
        "status": payload.status
    })))
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct MealRequestStatus {
    pub ticket_id: String,
    pub status: String,
    #[schema(nullable = true)]
    pub remarks: Option<String>,
    pub meal: String,
    pub quantity: u32,
    pub requested_by: String,
    #[schema(value_type = String, format = "date-time")]
    pub request_time: NaiveDateTime,
}

/// Meal request status by ticket
#[utoipa::path(
    get,
    path = "/api/v1/meals/requests/{ticket_id}",
    params(("ticket_id", Path, description = "Meal request ticket")),
    responses(
        (status = 200, description = "Meal request status", body = MealRequestStatus),
        (status = 404, description = "Meal request not found")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn meal_request_status(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let ticket_id = path.into_inner();

    let status = sqlx::query_as::<_, MealRequestStatus>(
        r#"
        SELECT mr.ticket_id, mr.status, mr.remarks, m.name AS meal,
               mr.quantity, u.name AS requested_by, mr.request_time
        FROM meal_requests mr
        JOIN meals m ON m.id = mr.meal_id
        JOIN users u ON u.id = mr.user_id
        WHERE mr.ticket_id = ?
        "#,
    )
    .bind(&ticket_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    match status {
        Some(s) => Ok(HttpResponse::Ok().json(s)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Meal request not found"
        }))),
    }
}

/// Serve/consume history for a meal request
#[utoipa::path(
    get,
    path = "/api/v1/meals/entries/{ticket_id}",
    params(("ticket_id", Path, description = "Meal request ticket")),
    responses(
        (status = 200, description = "Serve/consume rows", body = [MealEntry]),
        (status = 404, description = "Meal request not found")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn meal_entries(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let ticket_id = path.into_inner();

    let request_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM meal_requests WHERE ticket_id = ?",
    )
    .bind(&ticket_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let request_id = match request_id {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Meal request not found"
            })));
        }
    };

    let entries = sqlx::query_as::<_, MealEntry>(
        r#"
        SELECT id, meal_request_id, plant_id, date_of_meal, serve_time, consume_time
        FROM meal_entries
        WHERE meal_request_id = ?
        ORDER BY date_of_meal DESC, id DESC
        "#,
    )
    .bind(request_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(entries))
}

/// Serve/consume cycle for an approved meal request
///
/// First scan of the day serves the meal, the second marks it consumed, a
/// later scan starts a fresh serve cycle.
#[utoipa::path(
    post,
    path = "/api/v1/meals/entries/{ticket_id}",
    params(("ticket_id", Path, description = "Meal request ticket")),
    responses(
        (status = 200, description = "Serve or consume recorded"),
        (status = 403, description = "Meal request not approved"),
        (status = 404, description = "Meal request not found")
    ),
    tag = "Meal",
    security(("bearer_auth" = []))
)]
pub async fn meal_entry(
    pool: web::Data<MySqlPool>,
    clock: web::Data<CivilClock>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let ticket_id = path.into_inner();

    let request = sqlx::query_as::<_, (u64, String, Option<u64>)>(
        "SELECT id, status, plant_id FROM meal_requests WHERE ticket_id = ?",
    )
    .bind(&ticket_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let (request_id, status, plant_id) = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Meal request not found"
            })));
        }
    };

    if status != "APPROVED" {
        return Ok(HttpResponse::Forbidden().json(json!({
            "message": "Only approved meal requests can be served/consumed"
        })));
    }

    let today = clock.today();
    let now = clock.now().naive_local();

    let latest = sqlx::query_as::<_, (u64, Option<NaiveDateTime>, Option<NaiveDateTime>)>(
        r#"
        SELECT id, serve_time, consume_time
        FROM meal_entries
        WHERE meal_request_id = ? AND date_of_meal = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(request_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let action = match latest {
        Some((entry_id, Some(_), None)) => {
            sqlx::query("UPDATE meal_entries SET consume_time = ? WHERE id = ?")
                .bind(now)
                .bind(entry_id)
                .execute(pool.get_ref())
                .await
                .map_err(ErrorInternalServerError)?;
            "consumed"
        }
        _ => {
            sqlx::query(
                r#"
                INSERT INTO meal_entries (meal_request_id, plant_id, date_of_meal, serve_time)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(request_id)
            .bind(plant_id)
            .bind(today)
            .bind(now)
            .execute(pool.get_ref())
            .await
            .map_err(ErrorInternalServerError)?;
            "served"
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "ticket_id": ticket_id,
        "recorded": action,
        "time": now
    })))
}
