// src/error.rs
use chrono::NaiveDate;
use thiserror::Error;

use crate::duty_engine::DutyState;

#[derive(Error, Debug)]
pub enum DutyError {
    #[error("No profile found. Run onboarding first.")]
    NotOnboarded,
    #[error("A profile already exists for {0}")]
    AlreadyOnboarded(String),
    #[error("Today ({date}) is not a scheduled duty day ({state}); attendance can only be confirmed during a work shift")]
    NotOnDuty { date: NaiveDate, state: DutyState },
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
    #[error("Invalid overtime entry: {0}")]
    InvalidOvertime(String),
    #[error("Invalid month key '{0}', expected YYYY-MM")]
    InvalidMonthKey(String),
    #[error("I/O error ({context}): {source}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Report export failed: {0}")]
    Export(String),
    #[error("Monthly totals overflowed while summing {0}")]
    SummaryOverflow(&'static str),
}

impl DutyError {
    pub(crate) fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        DutyError::Io {
            source,
            context: context.into(),
        }
    }
}
