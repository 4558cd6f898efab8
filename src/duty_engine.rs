// src/duty_engine.rs
//! Duty-cycle arithmetic: 24h on shift followed by 48h off, with every day
//! boundary anchored at 07:00 local time.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::error::DutyError;
use crate::models::MonthKey;

/// Local hour at which every shift starts and ends.
pub const ANCHOR_HOUR: u32 = 7;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;
const CYCLE_MS: i64 = 3 * DAY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DutyState {
    #[serde(rename = "work")]
    Work,
    #[serde(rename = "off1")]
    OffDay1,
    #[serde(rename = "off2")]
    OffDay2,
}

impl DutyState {
    pub fn is_work(self) -> bool {
        matches!(self, DutyState::Work)
    }

    /// Short machine-friendly code, also used in CSV exports.
    pub fn code(self) -> &'static str {
        match self {
            DutyState::Work => "work",
            DutyState::OffDay1 => "off1",
            DutyState::OffDay2 => "off2",
        }
    }
}

impl fmt::Display for DutyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DutyState::Work => "on shift",
            DutyState::OffDay1 => "off day 1",
            DutyState::OffDay2 => "off day 2",
        };
        f.write_str(label)
    }
}

/// Remaining time until the next handover, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Countdown {
    total_seconds: i64,
}

impl Countdown {
    /// Floors to whole seconds and clamps negative input to zero.
    pub fn from_millis(ms: i64) -> Self {
        Self {
            total_seconds: ms.max(0) / 1000,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.total_seconds
    }

    pub fn hours(&self) -> i64 {
        self.total_seconds / 3600
    }

    pub fn minutes(&self) -> i64 {
        (self.total_seconds / 60) % 60
    }

    pub fn seconds(&self) -> i64 {
        self.total_seconds % 60
    }

    /// Zero-padded (hours, minutes, seconds) for display. Hours are not
    /// wrapped at 24.
    pub fn padded(&self) -> (String, String, String) {
        (
            format!("{:02}", self.hours()),
            format!("{:02}", self.minutes()),
            format!("{:02}", self.seconds()),
        )
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.padded();
        write!(f, "{}:{}:{}", h, m, s)
    }
}

fn anchor_time() -> NaiveTime {
    NaiveTime::from_hms_opt(ANCHOR_HOUR, 0, 0).unwrap_or_default()
}

/// The anchor instant (07:00) of a calendar date.
pub fn anchor_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(anchor_time())
}

/// Moves any instant to the anchor hour of its own date.
pub fn normalize_cycle_start(cycle_start: NaiveDateTime) -> NaiveDateTime {
    anchor_of(cycle_start.date())
}

/// Milliseconds since the normalized cycle start, or the (negative) distance
/// to it when `now` lies before the first shift.
fn elapsed_ms(cycle_start: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - normalize_cycle_start(cycle_start)).num_milliseconds()
}

pub fn compute_status(cycle_start: NaiveDateTime, now: NaiveDateTime) -> DutyState {
    let elapsed = elapsed_ms(cycle_start, now);
    if elapsed < 0 {
        return DutyState::OffDay2;
    }

    let position = elapsed % CYCLE_MS;
    if position < DAY_MS {
        DutyState::Work
    } else if position < 2 * DAY_MS {
        DutyState::OffDay1
    } else {
        DutyState::OffDay2
    }
}

/// Time left until the current shift is handed over (on shift) or until the
/// next shift starts (off duty).
pub fn compute_remaining(cycle_start: NaiveDateTime, now: NaiveDateTime) -> Countdown {
    let elapsed = elapsed_ms(cycle_start, now);
    if elapsed < 0 {
        // Before the first shift: count down to it.
        return Countdown::from_millis(-elapsed);
    }

    let position = elapsed % CYCLE_MS;
    let remaining = match compute_status(cycle_start, now) {
        DutyState::Work => DAY_MS - position,
        DutyState::OffDay1 | DutyState::OffDay2 => CYCLE_MS - position,
    };
    Countdown::from_millis(remaining)
}

/// Days left in the month of `today`, i.e. until the monthly report is due.
pub fn days_until_month_end(today: NaiveDate) -> u32 {
    let last_day = MonthKey::from_date(today).last_day();
    last_day.day().saturating_sub(today.day())
}

/// One row of the monthly duty calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    /// State of the shift that begins at the anchor hour of `date`.
    pub state: DutyState,
}

fn schedule_between(cycle_start: NaiveDateTime, from: NaiveDate, to: NaiveDate) -> Vec<ScheduleDay> {
    let mut days = Vec::new();
    let mut current = Some(from);
    while let Some(date) = current {
        if date > to {
            break;
        }
        days.push(ScheduleDay {
            date,
            weekday: date.weekday(),
            state: compute_status(cycle_start, anchor_of(date)),
        });
        current = date.succ_opt();
    }
    days
}

/// The duty calendar from `from` to the end of its month, inclusive.
pub fn month_schedule(cycle_start: NaiveDateTime, from: NaiveDate) -> Vec<ScheduleDay> {
    let last_day = MonthKey::from_date(from).last_day();
    schedule_between(cycle_start, from, last_day)
}

/// The duty calendar of an entire month.
pub fn full_month_schedule(cycle_start: NaiveDateTime, month: MonthKey) -> Vec<ScheduleDay> {
    schedule_between(cycle_start, month.first_day(), month.last_day())
}

#[derive(Debug, Serialize)]
struct ScheduleRow<'a> {
    date: String,
    weekday: String,
    state: &'a str,
}

/// Writes the calendar as `date,weekday,state` CSV rows.
pub fn write_schedule_csv<W: Write>(days: &[ScheduleDay], writer: W) -> Result<(), DutyError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for day in days {
        wtr.serialize(ScheduleRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            weekday: day.weekday.to_string(),
            state: day.state.code(),
        })?;
    }
    wtr.flush()
        .map_err(|e| DutyError::io(e, "flushing schedule CSV"))?;
    Ok(())
}
