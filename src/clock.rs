use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Abstraction over the current local wall-clock time, so "today" and new
/// expense timestamps are deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Uses the machine's local timezone.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Wall-clock time in an explicit IANA timezone.
#[derive(Debug, Clone)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for ZonedClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// A clock pinned to noon on `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self {
            now: date.and_hms_opt(12, 0, 0).unwrap_or_default(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_today_is_date_part() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let clock = FixedClock::at_date(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now(), date.and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn zoned_clock_tracks_its_timezone() {
        let utc = ZonedClock::new(chrono_tz::UTC);
        let tokyo = ZonedClock::new(chrono_tz::Asia::Tokyo);
        let diff = tokyo.now() - utc.now();
        assert!((diff.num_minutes() - 9 * 60).abs() <= 1);
    }
}
