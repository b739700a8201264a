use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::device::{DeviceError, DeviceEvent};
use crate::model::attendance::DailyAttendance;
use crate::reconcile::clock::CivilClock;
use crate::reconcile::store::{
    ActiveWorker, AttendancePatch, AttendanceStore, DeviceEventReader, NewAttendance,
    WorkerDirectory,
};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("device event source failed: {0}")]
    Source(#[from] DeviceError),

    #[error("failed to enumerate active workers: {0}")]
    Directory(#[source] anyhow::Error),

    #[error("a reconciliation pass is already running")]
    AlreadyRunning,
}

/// What one worker's daily record needs, given the day's events.
///
/// One variant per merge case so each branch is unit-testable on its own:
/// the nested null-checks this replaces hid the cases from the type system.
#[derive(Debug, PartialEq)]
pub enum MergePlan {
    /// No record yet, events seen today
    Create {
        first_in: NaiveDateTime,
        last_out: NaiveDateTime,
        hours: f64,
    },
    /// Record exists but carries no first-in (absence marker); events arrived
    /// later in the day, so the whole span is rebuilt from them
    Backfill {
        first_in: NaiveDateTime,
        last_out: NaiveDateTime,
        hours: f64,
    },
    /// Record has an authoritative first-in; only a strictly later last
    /// event moves last-out forward
    ExtendOut {
        last_out: NaiveDateTime,
        hours: f64,
    },
    /// No record and no events: write the absence marker
    MarkAbsent,
    /// Nothing to change
    Skip,
}

pub fn working_hours(first_in: NaiveDateTime, last_out: NaiveDateTime) -> f64 {
    let secs = (last_out - first_in).num_seconds() as f64;
    ((secs / 3600.0) * 100.0).round() / 100.0
}

/// Decide what to do with one worker's record. Pure; events need not be
/// sorted, the span is taken from the extremes.
pub fn plan_merge(existing: Option<&DailyAttendance>, events: &[DeviceEvent]) -> MergePlan {
    let span = events
        .iter()
        .map(|e| e.time.naive_local())
        .fold(None::<(NaiveDateTime, NaiveDateTime)>, |acc, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        });

    match (existing, span) {
        (None, Some((first, last))) => MergePlan::Create {
            first_in: first,
            last_out: last,
            hours: working_hours(first, last),
        },

        (Some(record), Some((first, last))) => match record.first_in {
            // An unset first-in means the record carries no trustworthy
            // bound yet; rebuild it from the full event span.
            None => MergePlan::Backfill {
                first_in: first,
                last_out: last,
                hours: working_hours(first, last),
            },
            Some(first_in) => {
                let moves_forward = match record.last_out {
                    Some(last_out) => last > last_out,
                    None => true,
                };
                if moves_forward {
                    MergePlan::ExtendOut {
                        last_out: last,
                        hours: working_hours(first_in, last),
                    }
                } else {
                    MergePlan::Skip
                }
            }
        },

        (None, None) => MergePlan::MarkAbsent,

        // A captured attendance is never erased just because the event
        // window is empty now.
        (Some(_), None) => MergePlan::Skip,
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkerFailure {
    pub worker_id: u64,
    #[schema(example = "LAB000042")]
    pub employee_no: String,
    pub error: String,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconcileReport {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub absent: u32,
    pub failures: Vec<WorkerFailure>,
}

impl ReconcileReport {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            created: 0,
            updated: 0,
            unchanged: 0,
            absent: 0,
            failures: Vec::new(),
        }
    }

    pub fn processed(&self) -> u32 {
        self.created + self.updated + self.unchanged + self.absent
    }

    pub fn outcome(&self) -> &'static str {
        if self.failures.is_empty() {
            "completed"
        } else {
            "completed_with_errors"
        }
    }
}

/// Run one reconciliation pass for `today`.
///
/// Idempotent: a second pass over the same event set leaves the store
/// byte-identical. A device failure aborts the whole pass (rows already
/// written stay); a single worker's write failure is recorded in the report
/// and the pass moves on.
pub async fn reconcile(
    today: NaiveDate,
    clock: &CivilClock,
    reader: &dyn DeviceEventReader,
    directory: &dyn WorkerDirectory,
    store: &dyn AttendanceStore,
) -> Result<ReconcileReport, ReconcileError> {
    let mut report = ReconcileReport::new(today);

    let workers = directory
        .list_active_workers()
        .await
        .map_err(ReconcileError::Directory)?;

    if workers.is_empty() {
        debug!(%today, "No active workers, nothing to reconcile");
        return Ok(report);
    }

    let (start, end) = clock.day_window(today);
    let events = reader.events_for_window(start, end).await?;

    let mut by_employee: HashMap<&str, Vec<&DeviceEvent>> = HashMap::new();
    for event in &events {
        by_employee
            .entry(event.employee_no.as_str())
            .or_default()
            .push(event);
    }
    for bucket in by_employee.values_mut() {
        bucket.sort_by_key(|e| e.time);
    }

    for worker in &workers {
        let worker_events: Vec<DeviceEvent> = by_employee
            .get(worker.employee_no.as_str())
            .map(|bucket| bucket.iter().map(|e| (*e).clone()).collect())
            .unwrap_or_default();

        if let Err(e) = apply_for_worker(worker, &worker_events, today, store, &mut report).await {
            warn!(
                worker_id = worker.id,
                employee_no = %worker.employee_no,
                error = %e,
                "Worker attendance write failed, continuing with remaining workers"
            );
            report.failures.push(WorkerFailure {
                worker_id: worker.id,
                employee_no: worker.employee_no.clone(),
                error: e.to_string(),
            });
        }
    }

    debug!(
        %today,
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        absent = report.absent,
        failed = report.failures.len(),
        "Reconciliation pass finished"
    );

    Ok(report)
}

async fn apply_for_worker(
    worker: &ActiveWorker,
    events: &[DeviceEvent],
    today: NaiveDate,
    store: &dyn AttendanceStore,
    report: &mut ReconcileReport,
) -> anyhow::Result<()> {
    let existing = store.find_record(worker.id, today).await?;

    match plan_merge(existing.as_ref(), events) {
        MergePlan::Create {
            first_in,
            last_out,
            hours,
        } => {
            store
                .create_record(NewAttendance {
                    worker_id: worker.id,
                    date: today,
                    first_in: Some(first_in),
                    last_out: Some(last_out),
                    working_hours: hours,
                })
                .await?;
            report.created += 1;
        }

        MergePlan::Backfill {
            first_in,
            last_out,
            hours,
        } => {
            let record = existing.expect("backfill requires an existing record");
            store
                .update_record(
                    record.id,
                    AttendancePatch {
                        first_in: Some(first_in),
                        last_out,
                        working_hours: hours,
                    },
                )
                .await?;
            report.updated += 1;
        }

        MergePlan::ExtendOut { last_out, hours } => {
            let record = existing.expect("extend requires an existing record");
            store
                .update_record(
                    record.id,
                    AttendancePatch {
                        first_in: None, // first-in is authoritative once set
                        last_out,
                        working_hours: hours,
                    },
                )
                .await?;
            report.updated += 1;
        }

        MergePlan::MarkAbsent => {
            store
                .create_record(NewAttendance {
                    worker_id: worker.id,
                    date: today,
                    first_in: None,
                    last_out: None,
                    working_hours: 0.0,
                })
                .await?;
            report.absent += 1;
        }

        MergePlan::Skip => {
            report.unchanged += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    const IST: i32 = 330;

    fn clock() -> CivilClock {
        CivilClock::new(IST)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn event(no: &str, h: u32, m: u32) -> DeviceEvent {
        DeviceEvent {
            employee_no: no.to_string(),
            time: FixedOffset::east_opt(IST * 60)
                .unwrap()
                .with_ymd_and_hms(2025, 3, 14, h, m, 0)
                .unwrap(),
        }
    }

    fn local(h: u32, m: u32) -> NaiveDateTime {
        today().and_hms_opt(h, m, 0).unwrap()
    }

    struct FakeReader {
        events: Vec<DeviceEvent>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl DeviceEventReader for FakeReader {
        async fn events_for_window(
            &self,
            _start: chrono::DateTime<FixedOffset>,
            _end: chrono::DateTime<FixedOffset>,
        ) -> Result<Vec<DeviceEvent>, DeviceError> {
            if self.fail {
                return Err(DeviceError::Status(503));
            }
            Ok(self.events.clone())
        }
    }

    struct FakeDirectory {
        workers: Vec<ActiveWorker>,
    }

    #[async_trait::async_trait]
    impl WorkerDirectory for FakeDirectory {
        async fn list_active_workers(&self) -> anyhow::Result<Vec<ActiveWorker>> {
            Ok(self.workers.clone())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<HashMap<(u64, NaiveDate), DailyAttendance>>,
        next_id: AtomicU64,
        fail_worker: Option<u64>,
    }

    impl FakeStore {
        fn snapshot(&self) -> Vec<DailyAttendance> {
            let mut rows: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
            rows.sort_by_key(|r| (r.worker_id, r.date));
            rows
        }

        fn seed(&self, record: DailyAttendance) {
            self.rows
                .lock()
                .unwrap()
                .insert((record.worker_id, record.date), record);
        }
    }

    #[async_trait::async_trait]
    impl AttendanceStore for FakeStore {
        async fn find_record(
            &self,
            worker_id: u64,
            date: NaiveDate,
        ) -> anyhow::Result<Option<DailyAttendance>> {
            Ok(self.rows.lock().unwrap().get(&(worker_id, date)).cloned())
        }

        async fn create_record(&self, data: NewAttendance) -> anyhow::Result<DailyAttendance> {
            if self.fail_worker == Some(data.worker_id) {
                anyhow::bail!("simulated write failure");
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&(data.worker_id, data.date)) {
                anyhow::bail!("duplicate (worker, date) row");
            }
            let record = DailyAttendance {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                worker_id: data.worker_id,
                date: data.date,
                first_in: data.first_in,
                last_out: data.last_out,
                working_hours: data.working_hours,
            };
            rows.insert((data.worker_id, data.date), record.clone());
            Ok(record)
        }

        async fn update_record(&self, id: u64, patch: AttendancePatch) -> anyhow::Result<()> {
            let mut rows = self.rows.lock().unwrap();
            let record = rows
                .values_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| anyhow::anyhow!("no record {}", id))?;
            if let Some(first_in) = patch.first_in {
                record.first_in = Some(first_in);
            }
            record.last_out = Some(patch.last_out);
            record.working_hours = patch.working_hours;
            Ok(())
        }
    }

    fn workers(n: u64) -> Vec<ActiveWorker> {
        (1..=n)
            .map(|i| ActiveWorker {
                id: i,
                employee_no: format!("LAB{:06}", i),
                name: format!("Worker {}", i),
            })
            .collect()
    }

    async fn run(
        reader: &FakeReader,
        directory: &FakeDirectory,
        store: &FakeStore,
    ) -> ReconcileReport {
        reconcile(today(), &clock(), reader, directory, store)
            .await
            .expect("pass should succeed")
    }

    // ---- plan_merge branches ----

    #[test]
    fn single_duplicated_ping_creates_zero_hour_record() {
        // Scenario: one door-open ping observed twice
        let plan = plan_merge(None, &[event("LAB000001", 9, 0), event("LAB000001", 9, 0)]);
        assert_eq!(
            plan,
            MergePlan::Create {
                first_in: local(9, 0),
                last_out: local(9, 0),
                hours: 0.0,
            }
        );
    }

    #[test]
    fn later_event_extends_last_out_and_recomputes_hours() {
        let existing = DailyAttendance {
            id: 1,
            worker_id: 1,
            date: today(),
            first_in: Some(local(9, 0)),
            last_out: Some(local(12, 0)),
            working_hours: 3.0,
        };
        // New window carries an 11:00 and a 14:00 event
        let plan = plan_merge(
            Some(&existing),
            &[event("LAB000001", 11, 0), event("LAB000001", 14, 0)],
        );
        assert_eq!(
            plan,
            MergePlan::ExtendOut {
                last_out: local(14, 0),
                hours: 5.0,
            }
        );
    }

    #[test]
    fn absence_marker_is_backfilled_from_full_span() {
        let existing = DailyAttendance {
            id: 1,
            worker_id: 1,
            date: today(),
            first_in: None,
            last_out: None,
            working_hours: 0.0,
        };
        let plan = plan_merge(
            Some(&existing),
            &[event("LAB000001", 8, 15), event("LAB000001", 17, 45)],
        );
        assert_eq!(
            plan,
            MergePlan::Backfill {
                first_in: local(8, 15),
                last_out: local(17, 45),
                hours: 9.5,
            }
        );
    }

    #[test]
    fn earlier_events_never_touch_first_in_or_last_out() {
        let existing = DailyAttendance {
            id: 1,
            worker_id: 1,
            date: today(),
            first_in: Some(local(9, 0)),
            last_out: Some(local(12, 0)),
            working_hours: 3.0,
        };
        // Device re-reports an earlier arrival and a not-later exit
        let plan = plan_merge(
            Some(&existing),
            &[event("LAB000001", 8, 0), event("LAB000001", 11, 0)],
        );
        assert_eq!(plan, MergePlan::Skip);
    }

    #[test]
    fn no_events_and_no_record_marks_absent() {
        assert_eq!(plan_merge(None, &[]), MergePlan::MarkAbsent);
    }

    #[test]
    fn empty_window_leaves_captured_attendance_alone() {
        let existing = DailyAttendance {
            id: 1,
            worker_id: 1,
            date: today(),
            first_in: Some(local(9, 0)),
            last_out: Some(local(12, 0)),
            working_hours: 3.0,
        };
        assert_eq!(plan_merge(Some(&existing), &[]), MergePlan::Skip);
    }

    // ---- full pass over the fakes ----

    #[tokio::test]
    async fn every_active_worker_ends_up_with_exactly_one_record() {
        let reader = FakeReader {
            events: vec![event("LAB000001", 9, 0), event("LAB000001", 18, 0)],
            fail: false,
        };
        let directory = FakeDirectory {
            workers: workers(3),
        };
        let store = FakeStore::default();

        let report = run(&reader, &directory, &store).await;

        assert_eq!(report.created, 1);
        assert_eq!(report.absent, 2);
        assert!(report.failures.is_empty());

        let rows = store.snapshot();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].working_hours, 9.0);
        assert_eq!(rows[1].first_in, None);
        assert_eq!(rows[1].working_hours, 0.0);
    }

    #[tokio::test]
    async fn pass_is_idempotent() {
        let reader = FakeReader {
            events: vec![event("LAB000001", 8, 15), event("LAB000001", 17, 45)],
            fail: false,
        };
        let directory = FakeDirectory {
            workers: workers(2),
        };
        let store = FakeStore::default();

        run(&reader, &directory, &store).await;
        let after_first = store.snapshot();

        let report = run(&reader, &directory, &store).await;
        let after_second = store.snapshot();

        assert_eq!(after_first, after_second);
        assert_eq!(report.created, 0);
        assert_eq!(report.unchanged, 2);
    }

    #[tokio::test]
    async fn first_in_is_immutable_across_passes() {
        let reader = FakeReader {
            events: vec![event("LAB000001", 9, 0), event("LAB000001", 12, 0)],
            fail: false,
        };
        let directory = FakeDirectory {
            workers: workers(1),
        };
        let store = FakeStore::default();

        run(&reader, &directory, &store).await;

        // A later fetch surfaces an earlier arrival plus a later exit
        let reader = FakeReader {
            events: vec![event("LAB000001", 7, 30), event("LAB000001", 14, 0)],
            fail: false,
        };
        run(&reader, &directory, &store).await;

        let rows = store.snapshot();
        assert_eq!(rows[0].first_in, Some(local(9, 0)));
        assert_eq!(rows[0].last_out, Some(local(14, 0)));
        assert_eq!(rows[0].working_hours, 5.0);
    }

    #[tokio::test]
    async fn last_out_never_decreases() {
        let reader = FakeReader {
            events: vec![event("LAB000001", 9, 0), event("LAB000001", 17, 0)],
            fail: false,
        };
        let directory = FakeDirectory {
            workers: workers(1),
        };
        let store = FakeStore::default();

        run(&reader, &directory, &store).await;

        let reader = FakeReader {
            events: vec![event("LAB000001", 9, 0), event("LAB000001", 13, 0)],
            fail: false,
        };
        let report = run(&reader, &directory, &store).await;

        assert_eq!(report.unchanged, 1);
        assert_eq!(store.snapshot()[0].last_out, Some(local(17, 0)));
    }

    #[tokio::test]
    async fn absence_marker_upgrades_when_events_arrive() {
        // Scenario C: absence row first, events show up later in the day
        let store = FakeStore::default();
        store.seed(DailyAttendance {
            id: 99,
            worker_id: 1,
            date: today(),
            first_in: None,
            last_out: None,
            working_hours: 0.0,
        });

        let reader = FakeReader {
            events: vec![event("LAB000001", 8, 15), event("LAB000001", 17, 45)],
            fail: false,
        };
        let directory = FakeDirectory {
            workers: workers(1),
        };

        let report = run(&reader, &directory, &store).await;

        assert_eq!(report.updated, 1);
        let rows = store.snapshot();
        assert_eq!(rows[0].first_in, Some(local(8, 15)));
        assert_eq!(rows[0].last_out, Some(local(17, 45)));
        assert_eq!(rows[0].working_hours, 9.5);
    }

    #[tokio::test]
    async fn device_failure_aborts_the_pass() {
        let reader = FakeReader {
            events: vec![],
            fail: true,
        };
        let directory = FakeDirectory {
            workers: workers(2),
        };
        let store = FakeStore::default();

        let err = reconcile(today(), &clock(), &reader, &directory, &store)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Source(_)));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn one_worker_write_failure_does_not_stop_the_rest() {
        let reader = FakeReader {
            events: vec![],
            fail: false,
        };
        let directory = FakeDirectory {
            workers: workers(3),
        };
        let store = FakeStore {
            fail_worker: Some(2),
            ..FakeStore::default()
        };

        let report = run(&reader, &directory, &store).await;

        assert_eq!(report.absent, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].worker_id, 2);
        assert_eq!(report.outcome(), "completed_with_errors");
        assert_eq!(store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn no_active_workers_is_a_clean_no_op() {
        let reader = FakeReader {
            events: vec![],
            fail: true, // must not even be consulted
        };
        let directory = FakeDirectory { workers: vec![] };
        let store = FakeStore::default();

        let report = run(&reader, &directory, &store).await;
        assert_eq!(report.processed(), 0);
        assert_eq!(report.outcome(), "completed");
    }
}
