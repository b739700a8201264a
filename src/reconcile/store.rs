//! Collaborator seams for the reconciliation engine: the worker directory,
//! the attendance store, and the device event reader. Trait objects so the
//! engine runs against in-memory fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::device::{DeviceClient, DeviceError, DeviceEvent};
use crate::model::attendance::DailyAttendance;

#[derive(Debug, Clone)]
pub struct ActiveWorker {
    pub id: u64,
    pub employee_no: String,
    pub name: String,
}

#[derive(Debug)]
pub struct NewAttendance {
    pub worker_id: u64,
    pub date: NaiveDate,
    pub first_in: Option<NaiveDateTime>,
    pub last_out: Option<NaiveDateTime>,
    pub working_hours: f64,
}

/// Update payload for an existing daily record. `first_in: None` means
/// "leave first-in as stored"; there is no way to clear a set first-in.
#[derive(Debug)]
pub struct AttendancePatch {
    pub first_in: Option<NaiveDateTime>,
    pub last_out: NaiveDateTime,
    pub working_hours: f64,
}

#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    async fn list_active_workers(&self) -> anyhow::Result<Vec<ActiveWorker>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_record(
        &self,
        worker_id: u64,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyAttendance>>;

    async fn create_record(&self, data: NewAttendance) -> anyhow::Result<DailyAttendance>;

    async fn update_record(&self, id: u64, patch: AttendancePatch) -> anyhow::Result<()>;
}

#[async_trait]
pub trait DeviceEventReader: Send + Sync {
    async fn events_for_window(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<DeviceEvent>, DeviceError>;
}

#[async_trait]
impl DeviceEventReader for DeviceClient {
    async fn events_for_window(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<DeviceEvent>, DeviceError> {
        self.fetch_events(start, end).await
    }
}

// ---- sqlx-backed implementations ----

pub struct SqlWorkerDirectory {
    pool: MySqlPool,
}

impl SqlWorkerDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkerDirectory for SqlWorkerDirectory {
    async fn list_active_workers(&self) -> anyhow::Result<Vec<ActiveWorker>> {
        let rows = sqlx::query_as::<_, (u64, String, String)>(
            r#"
            SELECT id, employee_no, name
            FROM workers
            WHERE is_active = TRUE AND employee_no <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, employee_no, name)| ActiveWorker {
                id,
                employee_no,
                name,
            })
            .collect())
    }
}

pub struct SqlAttendanceStore {
    pool: MySqlPool,
}

impl SqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for SqlAttendanceStore {
    async fn find_record(
        &self,
        worker_id: u64,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyAttendance>> {
        let record = sqlx::query_as::<_, DailyAttendance>(
            r#"
            SELECT id, worker_id, date, first_in, last_out, working_hours
            FROM daily_attendance
            WHERE worker_id = ? AND date = ?
            "#,
        )
        .bind(worker_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn create_record(&self, data: NewAttendance) -> anyhow::Result<DailyAttendance> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_attendance (worker_id, date, first_in, last_out, working_hours)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.worker_id)
        .bind(data.date)
        .bind(data.first_in)
        .bind(data.last_out)
        .bind(data.working_hours)
        .execute(&self.pool)
        .await?;

        Ok(DailyAttendance {
            id: result.last_insert_id(),
            worker_id: data.worker_id,
            date: data.date,
            first_in: data.first_in,
            last_out: data.last_out,
            working_hours: data.working_hours,
        })
    }

    async fn update_record(&self, id: u64, patch: AttendancePatch) -> anyhow::Result<()> {
        // COALESCE keeps the stored first-in when the patch carries none,
        // so a set first-in can never be overwritten from here either.
        sqlx::query(
            r#"
            UPDATE daily_attendance
            SET first_in = COALESCE(first_in, ?), last_out = ?, working_hours = ?
            WHERE id = ?
            "#,
        )
        .bind(patch.first_in)
        .bind(patch.last_out)
        .bind(patch.working_hours)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
