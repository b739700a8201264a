use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

/// One reconciled record joined with its worker, as the reports UI shows it
#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRow {
    pub id: u64,
    pub worker_id: u64,
    #[schema(example = "LAB000042")]
    pub employee_no: String,
    pub name: String,
    pub contractor_id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub first_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub last_out: Option<NaiveDateTime>,
    pub working_hours: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceQuery {
    pub worker_id: Option<u64>,
    pub contractor_id: Option<u64>,
    #[schema(example = "2025-03-01", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2025-03-14", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    /// date | first_in | last_out | working_hours
    pub sort_by: Option<String>,
    /// asc | desc
    pub order: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRow>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const SORTABLE: &[&str] = &["date", "first_in", "last_out", "working_hours"];

/// List reconciled attendance records
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(
        ("worker_id", Query, description = "Filter by worker"),
        ("contractor_id", Query, description = "Filter by contractor"),
        ("start_date", Query, description = "Range start (inclusive)"),
        ("end_date", Query, description = "Range end (inclusive)"),
        ("sort_by", Query, description = "date | first_in | last_out | working_hours"),
        ("order", Query, description = "asc | desc"),
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // Sort column comes from a whitelist, never from the raw query string
    let sort_by = match query.sort_by.as_deref() {
        Some(s) if SORTABLE.contains(&s) => s,
        _ => "date",
    };
    let order = match query.order.as_deref() {
        Some(o) if o.eq_ignore_ascii_case("asc") => "ASC",
        _ => "DESC",
    };

    let mut conditions = Vec::new();
    let mut bindings: Vec<sqlx::types::JsonValue> = Vec::new();

    if let Some(worker_id) = query.worker_id {
        conditions.push("da.worker_id = ?");
        bindings.push(worker_id.into());
    }

    if let Some(contractor_id) = query.contractor_id {
        conditions.push("w.contractor_id = ?");
        bindings.push(contractor_id.into());
    }

    if let Some(start_date) = query.start_date {
        conditions.push("da.date >= ?");
        bindings.push(start_date.to_string().into());
    }

    if let Some(end_date) = query.end_date {
        conditions.push("da.date <= ?");
        bindings.push(end_date.to_string().into());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM daily_attendance da JOIN workers w ON w.id = da.worker_id {}",
        where_clause
    );
    debug!(sql = %count_sql, "Counting attendance records");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count attendance records");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        r#"
        SELECT da.id, da.worker_id, w.employee_no, w.name, w.contractor_id,
               da.date, da.first_in, da.last_out, da.working_hours
        FROM daily_attendance da
        JOIN workers w ON w.id = da.worker_id
        {}
        ORDER BY da.{} {}
        LIMIT ? OFFSET ?
        "#,
        where_clause, sort_by, order
    );

    let mut data_query = sqlx::query_as::<_, AttendanceRow>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let rows = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch attendance records");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: rows,
        page,
        per_page,
        total,
    }))
}

/// Attendance records for one worker
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{worker_id}",
    params(
        ("worker_id", Path, description = "Worker ID"),
        ("start_date", Query, description = "Range start (inclusive)"),
        ("end_date", Query, description = "Range end (inclusive)")
    ),
    responses(
        (status = 200, description = "Worker attendance records", body = [AttendanceRow])
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn worker_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let worker_id = path.into_inner();

    let mut sql = String::from(
        r#"
        SELECT da.id, da.worker_id, w.employee_no, w.name, w.contractor_id,
               da.date, da.first_in, da.last_out, da.working_hours
        FROM daily_attendance da
        JOIN workers w ON w.id = da.worker_id
        WHERE da.worker_id = ?
        "#,
    );

    if query.start_date.is_some() {
        sql.push_str(" AND da.date >= ?");
    }
    if query.end_date.is_some() {
        sql.push_str(" AND da.date <= ?");
    }
    sql.push_str(" ORDER BY da.date DESC");

    let mut q = sqlx::query_as::<_, AttendanceRow>(&sql).bind(worker_id);
    if let Some(start_date) = query.start_date {
        q = q.bind(start_date);
    }
    if let Some(end_date) = query.end_date {
        q = q.bind(end_date);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, worker_id, "Failed to fetch worker attendance");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}
