// src/ledger.rs
use chrono::{NaiveDate, NaiveDateTime};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::duty_engine::compute_status;
use crate::error::DutyError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, OvertimeDraft, OvertimeRecord, UserProfile,
};

const OVERTIME_ID_LEN: usize = 12;
const SHIFT_HOURS: Decimal = dec!(24);

// --- Attendance ---

/// Appends `new_record` and keeps only the last record per date.
///
/// Survivors keep the order of their last occurrence, so re-confirming a date
/// moves it to the end of the ledger.
pub fn log_attendance(
    existing: &[AttendanceRecord],
    new_record: AttendanceRecord,
) -> Vec<AttendanceRecord> {
    let mut appended: Vec<AttendanceRecord> = existing.to_vec();
    appended.push(new_record);

    let mut last_index: HashMap<NaiveDate, usize> = HashMap::new();
    for (i, record) in appended.iter().enumerate() {
        last_index.insert(record.date, i);
    }

    appended
        .into_iter()
        .enumerate()
        .filter(|(i, record)| last_index.get(&record.date) == Some(i))
        .map(|(_, record)| record)
        .collect()
}

pub fn is_logged(existing: &[AttendanceRecord], date: NaiveDate) -> bool {
    existing.iter().any(|r| r.date == date)
}

/// Confirms attendance for the calendar day of `now`, returning the updated
/// ledger and the new record.
///
/// Rejected with [`DutyError::NotOnDuty`] unless `now` falls inside a work
/// shift; the ledger is untouched in that case.
pub fn confirm_attendance(
    profile: &UserProfile,
    existing: &[AttendanceRecord],
    now: NaiveDateTime,
) -> Result<(Vec<AttendanceRecord>, AttendanceRecord), DutyError> {
    let today = now.date();
    let state = compute_status(profile.cycle_start(), now);
    if !state.is_work() {
        warn!(
            "Attendance rejected for {} on {}: current state is {}",
            profile.name, today, state
        );
        return Err(DutyError::NotOnDuty { date: today, state });
    }

    let record = AttendanceRecord {
        date: today,
        status: AttendanceStatus::Work,
        logged_at: now,
    };
    if is_logged(existing, today) {
        info!("Attendance for {} re-confirmed, replacing earlier entry", today);
    } else {
        info!("Attendance confirmed for {}", today);
    }
    Ok((log_attendance(existing, record.clone()), record))
}

// --- Overtime ---

/// Pure append; entries on the same date are never merged.
pub fn add_overtime(existing: &[OvertimeRecord], new_record: OvertimeRecord) -> Vec<OvertimeRecord> {
    let mut updated = existing.to_vec();
    updated.push(new_record);
    updated
}

/// Random alphanumeric id, distinct from every id already in `existing`.
pub fn new_overtime_id(existing: &[OvertimeRecord]) -> String {
    let taken: HashSet<&str> = existing.iter().map(|r| r.id.as_str()).collect();
    loop {
        let candidate: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(OVERTIME_ID_LEN)
            .map(char::from)
            .collect();
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        debug!("Overtime id collision on {}, regenerating", candidate);
    }
}

/// Gives a validated draft its id and appends it.
pub fn record_overtime(
    existing: &[OvertimeRecord],
    draft: OvertimeDraft,
) -> (Vec<OvertimeRecord>, OvertimeRecord) {
    let record = OvertimeRecord {
        id: new_overtime_id(existing),
        date: draft.date,
        hours: draft.hours,
        description: draft.description,
    };
    info!(
        "Overtime recorded: {}h on {} (id {})",
        record.hours, record.date, record.id
    );
    (add_overtime(existing, record.clone()), record)
}

// --- Summary ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySummary {
    pub work_days: usize,
    pub overtime_hours: Decimal,
    pub total_hours: Decimal,
}

impl MonthlySummary {
    /// Totals for the open ledgers. Stored hours are not re-validated, so the
    /// arithmetic is checked.
    pub fn from_ledgers(
        attendance: &[AttendanceRecord],
        overtime: &[OvertimeRecord],
    ) -> Result<Self, DutyError> {
        let work_days = attendance.len();
        let overtime_hours = overtime
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.hours))
            .ok_or(DutyError::SummaryOverflow("overtime hours"))?;
        let total_hours = SHIFT_HOURS
            .checked_mul(Decimal::from(work_days as u64))
            .and_then(|shift_hours| shift_hours.checked_add(overtime_hours))
            .ok_or(DutyError::SummaryOverflow("total hours"))?;
        Ok(Self {
            work_days,
            overtime_hours,
            total_hours,
        })
    }
}
