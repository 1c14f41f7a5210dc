//! Time source.
//!
//! Expiry rules compare against "now"; services hold an `Arc<dyn Clock>` so
//! the rules are deterministic in tests.

use chrono::NaiveDate;
pub use mockable::{Clock, DefaultClock};

/// Calendar helpers on top of [`Clock`].
pub trait ClockExt: Clock {
    /// Current calendar day in UTC.
    fn today(&self) -> NaiveDate {
        self.utc().date_naive()
    }
}

impl<C: Clock + ?Sized> ClockExt for C {}

#[cfg(feature = "test-support")]
mod mutable {
    use std::sync::{Mutex, MutexGuard};

    use chrono::{DateTime, Local, TimeDelta, Utc};
    use mockable::Clock;

    /// Test clock that can be moved between assertions.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        pub fn advance(&self, delta: TimeDelta) {
            *self.lock_clock() += delta;
        }

        fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.lock_clock()
        }
    }
}

#[cfg(feature = "test-support")]
pub use mutable::MutableClock;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;

    #[test]
    fn test_today_uses_utc_date() {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .return_const(Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap());

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[cfg(feature = "test-support")]
    #[test]
    fn test_mutable_clock_advance_crosses_midnight() {
        let clock = MutableClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap());
        clock.advance(chrono::TimeDelta::hours(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }
}
