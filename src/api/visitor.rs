use crate::{
    auth::auth::AuthUser,
    model::visitor::{Visitor, VisitorEntry},
    reconcile::CivilClock,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

fn generate_ticket_id() -> String {
    let tail = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("VIS-{}", tail)
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct RegisterVisitor {
    #[schema(example = "Anita Deshmukh")]
    pub name: String,
    #[schema(example = "anita@example.com")]
    pub email: String,
    #[schema(example = "+919876501234")]
    pub contact: String,
    pub company_name: Option<String>,
    pub visit_purpose: Option<String>,
    pub meeting_with: Option<String>,
    pub plant_id: Option<u64>,
    #[schema(example = "2025-03-20", format = "date", value_type = String)]
    pub visit_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct ProcessVisitor {
    /// APPROVED or REJECTED
    #[schema(example = "APPROVED")]
    pub status: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VisitorQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    #[schema(example = "2025-03-20", format = "date", value_type = String)]
    pub visit_date: Option<NaiveDate>,
}

/// Register Visitor
#[utoipa::path(
    post,
    path = "/api/v1/visitors",
    request_body = RegisterVisitor,
    responses(
        (status = 201, description = "Visitor registered", body = Object, example = json!({
            "ticket_id": "VIS-3F9A21BC",
            "status": "PENDING"
        })),
        (status = 409, description = "Visitor with this email already exists")
    ),
    tag = "Visitor",
    security(("bearer_auth" = []))
)]
pub async fn register_visitor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RegisterVisitor>,
) -> actix_web::Result<impl Responder> {
    if payload.name.trim().is_empty()
        || payload.contact.trim().is_empty()
        || payload.email.trim().is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Missing required visitor information"
        })));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM visitors WHERE email = ? LIMIT 1)",
    )
    .bind(payload.email.trim())
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    if exists {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Visitor with this email already exists"
        })));
    }

    let ticket_id = generate_ticket_id();

    sqlx::query(
        r#"
        INSERT INTO visitors
        (ticket_id, name, email, contact, company_name, visit_purpose, meeting_with,
         plant_id, visit_date, status, request_time, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'PENDING', NOW(), ?)
        "#,
    )
    .bind(&ticket_id)
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(payload.contact.trim())
    .bind(&payload.company_name)
    .bind(&payload.visit_purpose)
    .bind(&payload.meeting_with)
    .bind(payload.plant_id)
    .bind(payload.visit_date)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to register visitor");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "ticket_id": ticket_id,
        "status": "PENDING"
    })))
}

/// Approve or reject a visitor request
#[utoipa::path(
    put,
    path = "/api/v1/visitors/{ticket_id}/process",
    params(("ticket_id", Path, description = "Visitor ticket")),
    request_body = ProcessVisitor,
    responses(
        (status = 200, description = "Visitor processed"),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Visitor not found")
    ),
    tag = "Visitor",
    security(("bearer_auth" = []))
)]
pub async fn process_visitor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<ProcessVisitor>,
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
        UPDATE visitors
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
    .map_err(|e| {
        error!(error = %e, %ticket_id, "Failed to process visitor");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Visitor not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "ticket_id": ticket_id,
        "status": payload.status
    })))
}

/// Get a visitor by ticket
#[utoipa::path(
    get,
    path = "/api/v1/visitors/{ticket_id}",
    params(("ticket_id", Path, description = "Visitor ticket")),
    responses(
        (status = 200, description = "Visitor found", body = Visitor),
        (status = 404, description = "Visitor not found")
    ),
    tag = "Visitor",
    security(("bearer_auth" = []))
)]
pub async fn get_visitor(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let ticket_id = path.into_inner();

    let visitor = sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE ticket_id = ?")
        .bind(&ticket_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

    match visitor {
        Some(v) => Ok(HttpResponse::Ok().json(v)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Visitor not found"
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/visitors",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("status", Query, description = "Filter by status"),
        ("visit_date", Query, description = "Filter by visit date")
    ),
    responses(
        (status = 200, description = "Paginated visitor list")
    ),
    tag = "Visitor",
    security(("bearer_auth" = []))
)]
pub async fn list_visitors(
    pool: web::Data<MySqlPool>,
    query: web::Query<VisitorQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone().into());
    }

    if let Some(visit_date) = query.visit_date {
        conditions.push("visit_date = ?");
        bindings.push(visit_date.to_string().into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM visitors {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query
        .fetch_one(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

    let data_sql = format!(
        "SELECT * FROM visitors {} ORDER BY request_time DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut data_query = sqlx::query_as::<_, Visitor>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let visitors = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch visitors");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "data": visitors,
        "page": page,
        "per_page": per_page,
        "total": total
    })))
}

/// Gate entry/exit history for a visitor
#[utoipa::path(
    get,
    path = "/api/v1/visitors/{ticket_id}/entries",
    params(("ticket_id", Path, description = "Visitor ticket")),
    responses(
        (status = 200, description = "Entry/exit rows", body = [VisitorEntry]),
        (status = 404, description = "Visitor not found")
    ),
    tag = "Visitor",
    security(("bearer_auth" = []))
)]
pub async fn visitor_entries(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let ticket_id = path.into_inner();

    let visitor_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM visitors WHERE ticket_id = ?",
    )
    .bind(&ticket_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let visitor_id = match visitor_id {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Visitor not found"
            })));
        }
    };

    let entries = sqlx::query_as::<_, VisitorEntry>(
        r#"
        SELECT id, visitor_id, date_of_visit, entry_time, exit_time
        FROM visitor_entries
        WHERE visitor_id = ?
        ORDER BY date_of_visit DESC, id DESC
        "#,
    )
    .bind(visitor_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(entries))
}

/// Gate entry/exit for an approved visitor
///
/// First scan of the day opens an entry, the next one closes it; a further
/// scan after a closed entry opens a fresh one (re-entry).
#[utoipa::path(
    post,
    path = "/api/v1/visitors/{ticket_id}/entry",
    params(("ticket_id", Path, description = "Visitor ticket")),
    responses(
        (status = 200, description = "Entry or exit recorded"),
        (status = 403, description = "Visitor not approved"),
        (status = 404, description = "Visitor not found")
    ),
    tag = "Visitor",
    security(("bearer_auth" = []))
)]
pub async fn visitor_entry(
    pool: web::Data<MySqlPool>,
    clock: web::Data<CivilClock>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let ticket_id = path.into_inner();

    let visitor = sqlx::query_as::<_, (u64, String)>(
        "SELECT id, status FROM visitors WHERE ticket_id = ?",
    )
    .bind(&ticket_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let (visitor_id, status) = match visitor {
        Some(v) => v,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Visitor not found"
            })));
        }
    };

    if status != "APPROVED" {
        return Ok(HttpResponse::Forbidden().json(json!({
            "message": "Only approved visitors can enter"
        })));
    }

    let today = clock.today();
    let now = clock.now().naive_local();

    // latest entry row for today, if any
    let latest = sqlx::query_as::<_, (u64, Option<chrono::NaiveDateTime>, Option<chrono::NaiveDateTime>)>(
        r#"
        SELECT id, entry_time, exit_time
        FROM visitor_entries
        WHERE visitor_id = ? AND date_of_visit = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(visitor_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let action = match latest {
        Some((entry_id, Some(_), None)) => {
            sqlx::query("UPDATE visitor_entries SET exit_time = ? WHERE id = ?")
                .bind(now)
                .bind(entry_id)
                .execute(pool.get_ref())
                .await
                .map_err(ErrorInternalServerError)?;
            "exit"
        }
        _ => {
            sqlx::query(
                r#"
                INSERT INTO visitor_entries (visitor_id, date_of_visit, entry_time)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(visitor_id)
            .bind(today)
            .bind(now)
            .execute(pool.get_ref())
            .await
            .map_err(ErrorInternalServerError)?;
            "entry"
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "ticket_id": ticket_id,
        "recorded": action,
        "time": now
    })))
}
