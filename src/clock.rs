// src/clock.rs
use chrono::{Local, NaiveDate, NaiveDateTime, ParseError, TimeDelta};
use std::sync::{Arc, Mutex};

pub const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct TestClock {
    current_time: Arc<Mutex<NaiveDateTime>>,
}

impl TestClock {
    pub fn at(dt: NaiveDateTime) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(dt)),
        }
    }

    /// Parses `YYYY-MM-DD HH:MM:SS`.
    pub fn new(datetime_str: &str) -> Result<Self, ParseError> {
        let dt = NaiveDateTime::parse_from_str(datetime_str, CLOCK_FORMAT)?;
        Ok(Self::at(dt))
    }

    pub fn set_time(&self, datetime_str: &str) -> Result<(), ParseError> {
        let dt = NaiveDateTime::parse_from_str(datetime_str, CLOCK_FORMAT)?;
        self.set(dt);
        Ok(())
    }

    pub fn set(&self, dt: NaiveDateTime) {
        *self.current_time.lock().unwrap_or_else(|p| p.into_inner()) = dt;
    }

    pub fn advance(&self, duration: TimeDelta) {
        *self.current_time.lock().unwrap_or_else(|p| p.into_inner()) += duration;
    }
}

impl Clock for TestClock {
    fn now(&self) -> NaiveDateTime {
        *self.current_time.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_moves_only_when_told() {
        let clock = TestClock::new("2024-01-31 23:59:00").unwrap();
        let shared = clock.clone();
        assert_eq!(clock.now(), clock.now());

        clock.advance(TimeDelta::minutes(2));
        assert_eq!(shared.now().to_string(), "2024-02-01 00:01:00");
        assert_eq!(shared.today(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        shared.set_time("2024-03-01 07:00:00").unwrap();
        assert_eq!(clock.now().to_string(), "2024-03-01 07:00:00");
        assert!(clock.set_time("yesterday").is_err());
    }
}
