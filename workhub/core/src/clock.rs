use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Source of the current instant.
///
/// Every attendance decision reads "now" through this trait so that tests can
/// pin the clock to an exact instant.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("UTC offset of {0} minutes is out of range")]
    OffsetOutOfRange(i32),
    #[error("Invalid late threshold '{0}', expected HH:MM")]
    InvalidLateThreshold(String),
}

/// The business timezone and the clock time after which a punch-in is late.
///
/// All day-boundary arithmetic for attendance goes through this type. The
/// server's own timezone and the client's timezone are never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkdayPolicy {
    offset: FixedOffset,
    late_after: NaiveTime,
}

impl WorkdayPolicy {
    /// Creates a policy from an offset east of UTC in minutes (330 is UTC+05:30).
    pub fn new(offset_minutes: i32, late_after: NaiveTime) -> Result<Self, PolicyError> {
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(PolicyError::OffsetOutOfRange(offset_minutes))?;
        Ok(Self { offset, late_after })
    }

    /// Same as [`WorkdayPolicy::new`] but takes the late threshold as `HH:MM`.
    pub fn parse(offset_minutes: i32, late_after: &str) -> Result<Self, PolicyError> {
        let late_after = NaiveTime::parse_from_str(late_after, "%H:%M")
            .map_err(|_| PolicyError::InvalidLateThreshold(late_after.to_string()))?;
        Self::new(offset_minutes, late_after)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn late_after(&self) -> NaiveTime {
        self.late_after
    }

    /// Renders an instant in the business timezone.
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    /// The calendar day an instant belongs to in the business timezone.
    pub fn business_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date_naive()
    }

    /// A punch at or after the threshold counts as late.
    pub fn is_late(&self, instant: DateTime<Utc>) -> bool {
        self.local(instant).time() >= self.late_after
    }

    /// First business day of a window of `days` days ending with the day of `now`.
    pub fn window_start(&self, now: DateTime<Utc>, days: u32) -> NaiveDate {
        let today = self.business_day(now);
        today - Duration::days(i64::from(days.saturating_sub(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist_policy() -> WorkdayPolicy {
        WorkdayPolicy::new(330, NaiveTime::from_hms_opt(9, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn can_derive_business_day_across_utc_midnight() {
        let policy = ist_policy();
        // 20:00 UTC is 01:30 the next day in IST.
        let late_evening_utc = Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap();
        assert_eq!(
            policy.business_day(late_evening_utc),
            NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
        );

        let early_utc = Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap();
        assert_eq!(
            policy.business_day(early_utc),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
    }

    #[test]
    fn late_threshold_is_inclusive() {
        let policy = ist_policy();
        // 03:30 UTC is exactly 09:00 IST.
        let nine_sharp = Utc.with_ymd_and_hms(2025, 3, 10, 3, 30, 0).unwrap();
        let just_before = nine_sharp - Duration::seconds(1);

        assert!(policy.is_late(nine_sharp));
        assert!(!policy.is_late(just_before));
    }

    #[test]
    fn can_read_now_through_clock() {
        let policy = ist_policy();
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .times(1)
            .returning(|| Utc.with_ymd_and_hms(2025, 3, 10, 3, 25, 0).unwrap());

        assert!(!policy.is_late(clock.now()));
    }

    #[test]
    fn can_parse_policy_from_config_values() {
        let policy = WorkdayPolicy::parse(330, "09:30").unwrap();
        assert_eq!(policy.late_after(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(policy.offset().local_minus_utc(), 330 * 60);
    }

    #[test]
    fn can_reject_invalid_policy_values() {
        assert_eq!(
            WorkdayPolicy::parse(330, "nine"),
            Err(PolicyError::InvalidLateThreshold("nine".to_string()))
        );
        assert_eq!(
            WorkdayPolicy::parse(24 * 60, "09:00"),
            Err(PolicyError::OffsetOutOfRange(24 * 60))
        );
    }

    #[test]
    fn window_includes_today() {
        let policy = ist_policy();
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap();

        assert_eq!(
            policy.window_start(now, 1),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert_eq!(
            policy.window_start(now, 30),
            NaiveDate::from_ymd_opt(2025, 2, 9).unwrap()
        );
    }
}
