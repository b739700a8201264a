use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    auth::auth::AuthUser,
    device::DeviceClient,
    reconcile::{AttendanceScheduler, ReconcileError},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

/// Trigger a reconciliation pass now
///
/// Runs synchronously and returns the pass report. While a scheduled or
/// manual pass holds the gate this returns 409; retry once it finishes.
#[utoipa::path(
    get,
    path = "/api/v1/camera/fetch",
    responses(
        (status = 200, description = "Pass finished", body = Object, example = json!({
            "message": "Attendance reconciled",
            "outcome": "completed",
            "report": {
                "date": "2025-03-14",
                "created": 12, "updated": 3, "unchanged": 40, "absent": 5,
                "failures": []
            }
        })),
        (status = 409, description = "A pass is already running"),
        (status = 502, description = "Device unreachable or malformed reply")
    ),
    tag = "Camera",
    security(("bearer_auth" = []))
)]
pub async fn fetch_attendance(
    auth: AuthUser,
    scheduler: web::Data<AttendanceScheduler>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    match scheduler.trigger_now().await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "message": "Attendance reconciled",
            "outcome": report.outcome(),
            "report": report
        }))),
        Err(ReconcileError::AlreadyRunning) => Ok(HttpResponse::Conflict().json(json!({
            "message": "A reconciliation pass is already running"
        }))),
        Err(ReconcileError::Source(e)) => {
            error!(error = %e, "Manual reconciliation failed at the device");
            Ok(HttpResponse::BadGateway().json(json!({
                "message": "Failed to fetch attendance from camera system",
                "detail": e.to_string()
            })))
        }
        Err(e) => {
            error!(error = %e, "Manual reconciliation failed");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Reconciliation failed",
                "detail": e.to_string()
            })))
        }
    }
}

/// Scheduler liveness and next run
#[utoipa::path(
    get,
    path = "/api/v1/camera/status",
    responses(
        (status = 200, description = "Scheduler status", body = Object, example = json!({
            "is_running": true,
            "next_execution_time": "2025-03-14T10:30:00+05:30",
            "last_run": null
        }))
    ),
    tag = "Camera",
    security(("bearer_auth" = []))
)]
pub async fn scheduler_status(
    auth: AuthUser,
    scheduler: web::Data<AttendanceScheduler>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    Ok(HttpResponse::Ok().json(scheduler.status().await))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CameraSearchQuery {
    pub name: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Search users provisioned on the device
///
/// The device list is cross-checked against the database: codes the backend
/// does not know (stale enrolments) are filtered out.
#[utoipa::path(
    get,
    path = "/api/v1/camera/search",
    params(
        ("name", Query, description = "Filter by name or employee code"),
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Device users known to the backend"),
        (status = 502, description = "Device unreachable")
    ),
    tag = "Camera",
    security(("bearer_auth" = []))
)]
pub async fn search_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    device: web::Data<Arc<DeviceClient>>,
    query: web::Query<CameraSearchQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let device_users = match device.search_users().await {
        Ok(users) => users,
        Err(e) => {
            error!(error = %e, "Device user search failed");
            return Ok(HttpResponse::BadGateway().json(json!({
                "message": "Failed to search user in camera system"
            })));
        }
    };

    let worker_codes = sqlx::query_scalar::<_, String>(
        "SELECT employee_no FROM workers WHERE employee_no <> ''",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let contractor_codes = sqlx::query_scalar::<_, String>(
        "SELECT employee_no FROM contractors WHERE employee_no <> ''",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let known: HashSet<String> = worker_codes
        .into_iter()
        .chain(contractor_codes)
        .collect();

    let mut users: Vec<_> = device_users
        .into_iter()
        .filter(|u| known.contains(&u.employee_no))
        .collect();

    if let Some(term) = &query.name {
        let term = term.to_lowercase();
        users.retain(|u| {
            u.name.to_lowercase().contains(&term)
                || u.employee_no.to_lowercase().contains(&term)
        });
    }

    let total = users.len();
    let page = query.page.unwrap_or(1).max(1) as usize;
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100) as usize;
    let start = (page - 1) * per_page;
    let page_users: Vec<_> = users.into_iter().skip(start).take(per_page).collect();

    Ok(HttpResponse::Ok().json(json!({
        "data": page_users,
        "page": page,
        "per_page": per_page,
        "total": total
    })))
}
