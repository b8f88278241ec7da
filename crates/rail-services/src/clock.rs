//! Time source for booking decisions
//!
//! Chart preparation depends on "today" in the railway's local calendar, so
//! the orchestrator never reads the system clock directly.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the railway's local time
    fn today(&self) -> NaiveDate;
}

/// Wall clock with a fixed local offset
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Offsets outside +-24h fall back to UTC
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// Clock frozen at one instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>, utc_offset_minutes: i32) -> Self {
        Self {
            at,
            offset: SystemClock::new(utc_offset_minutes).offset,
        }
    }

    /// Frozen at midday UTC on the given date
    pub fn on(date: NaiveDate) -> Self {
        let at = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self::new(at, 0)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }

    fn today(&self) -> NaiveDate {
        self.at.with_timezone(&self.offset).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_date_crosses_midnight_before_utc() {
        // 20:00 UTC is 01:30 the next day in IST
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
        let clock = FixedClock::new(at, 330);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());

        let utc = FixedClock::new(at, 0);
        assert_eq!(utc.today(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[test]
    fn test_fixed_clock_on_date() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 3).unwrap();
        let clock = FixedClock::on(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_out_of_range_offset_is_utc() {
        let clock = SystemClock::new(100_000);
        assert_eq!(clock.offset.local_minus_utc(), 0);
    }
}
