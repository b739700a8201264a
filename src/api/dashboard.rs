use crate::{auth::auth::AuthUser, reconcile::CivilClock};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::Datelike;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;

/// Dashboard summary
///
/// Visitor counters plus today's workforce presence, all in one call for the
/// landing page.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = Object, example = json!({
            "summary": {
                "today_visit_count": 4,
                "pending_request_count": 2,
                "monthly_visits_count": 37,
                "approved_visits_count": 120
            },
            "workforce": {"total_present": 52, "total_absent": 8}
        }))
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<CivilClock>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let today = clock.today();
    let month_start = today.with_day(1).unwrap();

    let today_visits = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM visitors WHERE visit_date = ?",
    )
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Dashboard: today visit count failed");
        ErrorInternalServerError("Database error")
    })?;

    let pending = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM visitors WHERE status = 'PENDING'",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let monthly_approved = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM visitors WHERE status = 'APPROVED' AND visit_date BETWEEN ? AND ?",
    )
    .bind(month_start)
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let total_approved = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM visitors WHERE status = 'APPROVED'",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let (present, absent) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT CAST(COALESCE(SUM(first_in IS NOT NULL), 0) AS SIGNED),
               CAST(COALESCE(SUM(first_in IS NULL), 0) AS SIGNED)
        FROM daily_attendance
        WHERE date = ?
        "#,
    )
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(json!({
        "summary": {
            "today_visit_count": today_visits,
            "pending_request_count": pending,
            "monthly_visits_count": monthly_approved,
            "approved_visits_count": total_approved
        },
        "workforce": {
            "total_present": present,
            "total_absent": absent
        }
    })))
}
