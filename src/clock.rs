use std::cell::Cell;

use chrono::{DateTime, Local, TimeDelta};

/// Source of wall-clock time for the timer
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Production clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-driven clock for tests and headless runs.
/// Interior mutability lets the owner of a timer advance time through `&self`.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Local>) {
        self.now.set(at);
    }

    pub fn advance(&self, delta: TimeDelta) {
        self.now.set(self.now.get() + delta);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(TimeDelta::seconds(secs));
    }

    pub fn advance_millis(&self, millis: i64) {
        self.advance(TimeDelta::milliseconds(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_advances() {
        let start = Local.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance_secs(90);
        assert_eq!(clock.now(), start + TimeDelta::seconds(90));
        clock.advance_millis(500);
        assert_eq!(clock.now(), start + TimeDelta::milliseconds(90_500));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
