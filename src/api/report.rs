use crate::{auth::auth::AuthUser, reconcile::CivilClock};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DailyReportQuery {
    /// Defaults to today (civil timezone)
    #[schema(example = "2025-03-14", format = "date", value_type = String)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomReportQuery {
    #[schema(example = "2025-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-03-14", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct DailyReportRow {
    pub worker_id: u64,
    #[schema(example = "LAB000042")]
    pub employee_no: String,
    pub name: String,
    pub contractor_id: Option<u64>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub first_in: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub last_out: Option<NaiveDateTime>,
    pub working_hours: f64,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct DateSummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_present: i64,
    pub total_absent: i64,
    pub total_workers: i64,
}

/// Daily attendance report
///
/// Per-worker rows plus the present/absent summary for one date. A worker is
/// PRESENT when the reconciled record carries a first-in.
#[utoipa::path(
    get,
    path = "/api/v1/reports/daily",
    params(("date", Query, description = "Report date, defaults to today")),
    responses(
        (status = 200, description = "Daily report", body = Object, example = json!({
            "date": "2025-03-14",
            "summary": {"total_present": 52, "total_absent": 8, "total_workers": 60},
            "rows": []
        }))
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn daily_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<CivilClock>,
    query: web::Query<DailyReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let date = query.date.unwrap_or_else(|| clock.today());

    let rows = sqlx::query_as::<_, DailyReportRow>(
        r#"
        SELECT da.worker_id, w.employee_no, w.name, w.contractor_id,
               da.first_in, da.last_out, da.working_hours
        FROM daily_attendance da
        JOIN workers w ON w.id = da.worker_id
        WHERE da.date = ?
        ORDER BY w.employee_no ASC
        "#,
    )
    .bind(date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, %date, "Failed to build daily report");
        ErrorInternalServerError("Database error")
    })?;

    let total_present = rows.iter().filter(|r| r.first_in.is_some()).count();
    let total_workers = rows.len();

    Ok(HttpResponse::Ok().json(json!({
        "date": date,
        "summary": {
            "total_present": total_present,
            "total_absent": total_workers - total_present,
            "total_workers": total_workers
        },
        "rows": rows
    })))
}

/// Attendance summary per date over a range
#[utoipa::path(
    get,
    path = "/api/v1/reports/custom",
    params(
        ("start_date", Query, description = "Range start (inclusive)"),
        ("end_date", Query, description = "Range end (inclusive)")
    ),
    responses(
        (status = 200, description = "Per-date summaries", body = [DateSummary]),
        (status = 400, description = "start_date after end_date")
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn custom_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CustomReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    if query.start_date > query.end_date {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "start_date must not be after end_date"
        })));
    }

    let summaries = sqlx::query_as::<_, DateSummary>(
        r#"
        SELECT date,
               CAST(SUM(first_in IS NOT NULL) AS SIGNED) AS total_present,
               CAST(SUM(first_in IS NULL) AS SIGNED)     AS total_absent,
               COUNT(*)                                  AS total_workers
        FROM daily_attendance
        WHERE date BETWEEN ? AND ?
        GROUP BY date
        ORDER BY date ASC
        "#,
    )
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to build custom report");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(summaries))
}
