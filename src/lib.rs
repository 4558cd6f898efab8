// src/lib.rs
//! Tracking for a rotating 24h-on / 48h-off duty cycle: live duty state and
//! countdown, daily attendance, overtime, and a monthly report that is exported
//! and reset when the calendar month changes.

pub mod clock;
pub mod config;
pub mod duty_engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod report;
pub mod rollover;
pub mod scheduler;
pub mod store;
pub mod tracker;


pub use clock::{Clock, SystemClock, TestClock};
pub use config::AppConfig;
pub use duty_engine::{compute_remaining, compute_status, Countdown, DutyState, ScheduleDay};
pub use error::DutyError;
pub use ledger::MonthlySummary;
pub use models::{
    AttendanceRecord, AttendanceStatus, JobTitle, MonthKey, OnboardingInput, OvertimeInput,
    OvertimeRecord, Theme, UserProfile,
};
pub use report::{ExportArtifact, ExportSink, FileExportSink, MemoryExportSink, ReportLanguage};
pub use rollover::RolloverOutcome;
pub use scheduler::run_duty_ticker;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use tracker::{DutySnapshot, DutyTracker, TickReport};
