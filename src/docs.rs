use crate::api::attendance::{AttendanceListResponse, AttendanceRow};
use crate::api::contractor::{ContractorListResponse, CreateContractor};
use crate::api::meal::{CreateMeal, MealRequestStatus, ProcessMealRequest, RequestMeal};
use crate::api::plant::CreatePlant;
use crate::api::report::{DailyReportRow, DateSummary};
use crate::api::system_code::UpdateSystemCode;
use crate::api::visitor::{ProcessVisitor, RegisterVisitor};
use crate::api::worker::{CreateWorker, WorkerListResponse};
use crate::model::attendance::DailyAttendance;
use crate::model::contractor::Contractor;
use crate::model::meal::{Meal, MealEntry, MealRequest};
use crate::model::plant::Plant;
use crate::model::system_code::SystemCode;
use crate::model::visitor::{Visitor, VisitorEntry};
use crate::model::worker::Worker;
use crate::reconcile::engine::{ReconcileReport, WorkerFailure};
use crate::reconcile::scheduler::{LastRun, SchedulerStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workforce & Facility Management API",
        version = "1.0.0",
        description = r#"
## Workforce & Facility Management (WFM) System

Backend for plant access control: contractors, labour, visitors, meals and
biometric-camera attendance.

### 🔹 Key Features
- **Worker & Contractor Management**
  - Onboarding with sequence-issued employee codes and device enrolment
- **Attendance Reconciliation**
  - Camera check-in/out events merged into one daily record per worker,
    every 30 minutes and on demand
- **Visitor Management**
  - Ticketed visit requests, approval flow, gate entry/exit
- **Meal Management**
  - Meal catalog, ticketed requests, serve/consume tracking
- **Reports & Dashboard**
  - Daily and ranged presence reports, landing-page counters

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Sensitive operations require **Admin** or **Manager** roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::worker::create_worker,
        crate::api::worker::list_workers,
        crate::api::worker::get_worker,
        crate::api::worker::update_worker,
        crate::api::worker::delete_worker,

        crate::api::contractor::create_contractor,
        crate::api::contractor::list_contractors,
        crate::api::contractor::get_contractor,
        crate::api::contractor::update_contractor,
        crate::api::contractor::delete_contractor,

        crate::api::plant::create_plant,
        crate::api::plant::list_plants,
        crate::api::plant::get_plant,
        crate::api::plant::update_plant,
        crate::api::plant::delete_plant,

        crate::api::visitor::register_visitor,
        crate::api::visitor::process_visitor,
        crate::api::visitor::get_visitor,
        crate::api::visitor::list_visitors,
        crate::api::visitor::visitor_entry,
        crate::api::visitor::visitor_entries,

        crate::api::meal::create_meal,
        crate::api::meal::list_meals,
        crate::api::meal::delete_meal,
        crate::api::meal::request_meal,
        crate::api::meal::list_meal_requests,
        crate::api::meal::process_meal_request,
        crate::api::meal::meal_request_status,
        crate::api::meal::meal_entry,
        crate::api::meal::meal_entries,

        crate::api::attendance::list_attendance,
        crate::api::attendance::worker_attendance,

        crate::api::camera::fetch_attendance,
        crate::api::camera::scheduler_status,
        crate::api::camera::search_users,

        crate::api::report::daily_report,
        crate::api::report::custom_report,

        crate::api::dashboard::summary,

        crate::api::system_code::list_system_codes,
        crate::api::system_code::update_system_code
    ),
    components(
        schemas(
            Worker,
            CreateWorker,
            WorkerListResponse,
            Contractor,
            CreateContractor,
            ContractorListResponse,
            Plant,
            CreatePlant,
            Visitor,
            VisitorEntry,
            RegisterVisitor,
            ProcessVisitor,
            Meal,
            MealRequest,
            MealEntry,
            CreateMeal,
            RequestMeal,
            ProcessMealRequest,
            MealRequestStatus,
            DailyAttendance,
            AttendanceRow,
            AttendanceListResponse,
            DailyReportRow,
            DateSummary,
            SystemCode,
            UpdateSystemCode,
            ReconcileReport,
            WorkerFailure,
            SchedulerStatus,
            LastRun
        )
    ),
    tags(
        (name = "Worker", description = "Labour management APIs"),
        (name = "Contractor", description = "Contractor management APIs"),
        (name = "Plant", description = "Plant management APIs"),
        (name = "Visitor", description = "Visitor management APIs"),
        (name = "Meal", description = "Meal management APIs"),
        (name = "Attendance", description = "Reconciled attendance APIs"),
        (name = "Camera", description = "Device integration and reconciliation control"),
        (name = "Report", description = "Attendance reporting APIs"),
        (name = "Dashboard", description = "Landing page summary"),
        (name = "SystemCode", description = "Employee code sequences"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
