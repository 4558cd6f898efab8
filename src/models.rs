// src/models.rs
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::duty_engine::anchor_of;
use crate::error::DutyError;

/// Smallest overtime entry accepted at the input boundary. Entries are whole
/// multiples of this step.
pub const MIN_OVERTIME_HOURS: Decimal = dec!(0.5);
/// One full shift.
pub const MAX_OVERTIME_HOURS: Decimal = dec!(24);

// --- Month Key ---

/// A calendar year-month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    // Always the first day of the month.
    first_day: NaiveDate,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month, so only the day is replaced.
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    /// Local calendar month of an instant.
    pub fn of(instant: NaiveDateTime) -> Self {
        Self::from_date(instant.date())
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = DutyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DutyError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !digits(year) || !digits(month) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = DutyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

// --- User Profile ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobTitle {
    #[serde(alias = "المهندس")]
    Engineer,
    #[serde(alias = "الفني")]
    Technician,
}

impl fmt::Display for JobTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTitle::Engineer => f.write_str("Engineer"),
            JobTitle::Technician => f.write_str("Technician"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    #[serde(alias = "نهاري")]
    Day,
    #[serde(alias = "ليلي")]
    Night,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Day => Theme::Night,
            Theme::Night => Theme::Day,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Day => f.write_str("day"),
            Theme::Night => f.write_str("night"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub job_title: JobTitle,
    /// Date of the first work shift.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_report_month: Option<MonthKey>,
}

impl UserProfile {
    /// The first shift's start, anchored at 07:00.
    pub fn cycle_start(&self) -> NaiveDateTime {
        anchor_of(self.start_date)
    }
}

/// Raw onboarding form values.
#[derive(Debug, Clone)]
pub struct OnboardingInput {
    pub name: String,
    pub job_title: JobTitle,
    pub start_date: String,
}

impl OnboardingInput {
    pub fn validate(self) -> Result<UserProfile, DutyError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DutyError::InvalidProfile("name must not be empty".into()));
        }
        let start_date = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d")
            .map_err(|_| {
                DutyError::InvalidProfile(format!(
                    "start date '{}' is not a valid YYYY-MM-DD date",
                    self.start_date
                ))
            })?;

        Ok(UserProfile {
            name: name.to_string(),
            job_title: self.job_title,
            start_date,
            theme: Theme::Day,
            last_report_month: None,
        })
    }
}

// --- Ledger Records ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Work,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub logged_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeRecord {
    pub id: String,
    pub date: NaiveDate,
    pub hours: Decimal,
    pub description: String,
}

/// Raw overtime form values, validated before they reach the ledger.
#[derive(Debug, Clone, Default)]
pub struct OvertimeInput {
    pub date: Option<String>,
    pub hours: String,
    pub description: String,
}

/// A validated overtime entry that has not been given an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OvertimeDraft {
    pub date: NaiveDate,
    pub hours: Decimal,
    pub description: String,
}

impl OvertimeInput {
    pub fn validate(self) -> Result<OvertimeDraft, DutyError> {
        let raw_date = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DutyError::InvalidOvertime("date is required".into()))?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            DutyError::InvalidOvertime(format!("'{}' is not a valid YYYY-MM-DD date", raw_date))
        })?;

        let hours = Decimal::from_str(self.hours.trim()).map_err(|_| {
            DutyError::InvalidOvertime(format!("'{}' is not a number of hours", self.hours))
        })?;
        if hours < MIN_OVERTIME_HOURS || hours > MAX_OVERTIME_HOURS {
            return Err(DutyError::InvalidOvertime(format!(
                "hours must be between {} and {}, got {}",
                MIN_OVERTIME_HOURS, MAX_OVERTIME_HOURS, hours
            )));
        }
        if !(hours / MIN_OVERTIME_HOURS).fract().is_zero() {
            return Err(DutyError::InvalidOvertime(format!(
                "hours must be in steps of {}, got {}",
                MIN_OVERTIME_HOURS, hours
            )));
        }

        Ok(OvertimeDraft {
            date,
            hours,
            description: self.description.trim().to_string(),
        })
    }
}
