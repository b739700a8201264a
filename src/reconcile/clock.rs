use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

/// Wall-clock time in the deployment's civil timezone.
///
/// Every plant runs in one configured UTC offset; "today" and day boundaries
/// are defined here, never in UTC.
#[derive(Clone, Copy)]
pub struct CivilClock {
    offset: FixedOffset,
}

impl CivilClock {
    pub fn new(offset_minutes: i32) -> Self {
        Self {
            offset: FixedOffset::east_opt(offset_minutes * 60)
                .expect("TZ_OFFSET_MINUTES out of range"),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// `[00:00:00, 23:59:59.999]` of `date` in the civil offset.
    pub fn day_window(&self, date: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let start = date.and_hms_opt(0, 0, 0).unwrap();
        let end = date.and_hms_milli_opt(23, 59, 59, 999).unwrap();
        (
            start.and_local_timezone(self.offset).unwrap(),
            end.and_local_timezone(self.offset).unwrap(),
        )
    }

    /// The next whole multiple of `interval_secs` counted from civil
    /// midnight; at the default 1800 s this is the next half-hour boundary.
    pub fn next_boundary(&self, interval_secs: u64) -> DateTime<FixedOffset> {
        self.next_boundary_after(self.now(), interval_secs)
    }

    pub fn next_boundary_after(
        &self,
        now: DateTime<FixedOffset>,
        interval_secs: u64,
    ) -> DateTime<FixedOffset> {
        let interval = interval_secs.max(1) as i64;
        let since_midnight = i64::from(now.num_seconds_from_midnight());
        let next = ((since_midnight / interval) + 1) * interval;

        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_local_timezone(self.offset)
            .unwrap();

        midnight + chrono::Duration::seconds(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const IST_MINUTES: i32 = 330;

    fn ist(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(IST_MINUTES * 60)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 14, h, m, s)
            .unwrap()
    }

    #[test]
    fn day_window_spans_the_civil_day() {
        let clock = CivilClock::new(IST_MINUTES);
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        let (start, end) = clock.day_window(date);

        assert_eq!(start.to_rfc3339(), "2025-03-14T00:00:00+05:30");
        assert_eq!(end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
        assert_eq!(end.date_naive(), date);
    }

    #[test]
    fn next_boundary_rounds_up_to_half_hour() {
        let clock = CivilClock::new(IST_MINUTES);

        let next = clock.next_boundary_after(ist(10, 5, 12), 1800);
        assert_eq!(next, ist(10, 30, 0));

        let next = clock.next_boundary_after(ist(10, 30, 0), 1800);
        assert_eq!(next, ist(11, 0, 0));
    }

    #[test]
    fn boundary_past_midnight_lands_on_next_day() {
        let clock = CivilClock::new(IST_MINUTES);

        let next = clock.next_boundary_after(ist(23, 45, 0), 1800);
        assert_eq!(next.to_rfc3339(), "2025-03-15T00:00:00+05:30");
    }
}
