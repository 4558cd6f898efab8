// src/rollover.rs
use chrono::NaiveDateTime;
use tracing::{debug, error, info};

use crate::error::DutyError;
use crate::models::{MonthKey, UserProfile};
use crate::report::{build_report, ExportSink, ReportLanguage};
use crate::store::{save_attendance, save_overtime, save_profile, KeyValueStore, TrackerState};

/// Where a profile stands relative to the current month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverPhase {
    /// No month has been stamped yet.
    Initial,
    Steady,
    /// The stamped month is no longer the current one.
    RolloverDue { stale: MonthKey },
}

pub fn classify(profile: &UserProfile, current: MonthKey) -> RolloverPhase {
    match profile.last_report_month {
        None => RolloverPhase::Initial,
        Some(stamped) if stamped == current => RolloverPhase::Steady,
        Some(stale) => RolloverPhase::RolloverDue { stale },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloverOutcome {
    NotOnboarded,
    /// First observation: the month was stamped, nothing exported.
    Stamped { month: MonthKey },
    Unchanged,
    /// `export` holds the sink location, or why the report could not be
    /// built or exported.
    RolledOver {
        closed: MonthKey,
        opened: MonthKey,
        export: Result<String, String>,
    },
}

/// One rollover observation at `now`.
///
/// On a due rollover the report for the stale month is exported from the
/// ledgers as they were, then both ledgers are cleared and persisted, then the
/// profile is stamped with the current month and persisted. A report that cannot
/// be built or exported is logged and reported in the outcome but does not
/// stop the reset.
///
/// If any of the reset writes fails, the ledgers and profile that were stored
/// before are written back and the error is returned, so the store never holds
/// cleared ledgers next to a stale month. `state` is only updated once every
/// write has succeeded.
pub fn evaluate_rollover<S, E>(
    state: &mut TrackerState,
    store: &S,
    sink: &E,
    now: NaiveDateTime,
    language: ReportLanguage,
) -> Result<RolloverOutcome, DutyError>
where
    S: KeyValueStore + ?Sized,
    E: ExportSink + ?Sized,
{
    let Some(profile) = state.profile.as_ref() else {
        debug!("Rollover check skipped: no profile");
        return Ok(RolloverOutcome::NotOnboarded);
    };
    let current = MonthKey::of(now);

    match classify(profile, current) {
        RolloverPhase::Steady => Ok(RolloverOutcome::Unchanged),
        RolloverPhase::Initial => {
            let stamped = UserProfile {
                last_report_month: Some(current),
                ..profile.clone()
            };
            save_profile(store, &stamped)?;
            info!("Report month initialised to {}", current);
            state.profile = Some(stamped);
            Ok(RolloverOutcome::Stamped { month: current })
        }
        RolloverPhase::RolloverDue { stale } => {
            info!("Month changed from {} to {}. Closing {}.", stale, current, stale);

            let export = build_report(profile, stale, &state.attendance, &state.overtime, language)
                .and_then(|artifact| sink.export(&artifact));
            let export = match export {
                Ok(location) => {
                    info!("Report for {} exported to {}", stale, location);
                    Ok(location)
                }
                Err(e) => {
                    error!("Report export for {} failed: {}. Resetting ledgers anyway.", stale, e);
                    Err(e.to_string())
                }
            };

            let stamped = UserProfile {
                last_report_month: Some(current),
                ..profile.clone()
            };
            if let Err(e) = persist_reset(store, &stamped) {
                error!("Rollover to {} could not be saved: {}. Restoring {}.", current, e, stale);
                restore(store, state);
                return Err(e);
            }

            info!(
                "Ledgers reset ({} attendance, {} overtime records closed). Report month is now {}",
                state.attendance.len(),
                state.overtime.len(),
                current
            );
            state.attendance.clear();
            state.overtime.clear();
            state.profile = Some(stamped);

            Ok(RolloverOutcome::RolledOver {
                closed: stale,
                opened: current,
                export,
            })
        }
    }
}

fn persist_reset<S: KeyValueStore + ?Sized>(store: &S, stamped: &UserProfile) -> Result<(), DutyError> {
    save_attendance(store, &[])?;
    save_overtime(store, &[])?;
    save_profile(store, stamped)
}

// Best effort: writes the pre-rollover entities back.
fn restore<S: KeyValueStore + ?Sized>(store: &S, previous: &TrackerState) {
    if let Err(e) = save_attendance(store, &previous.attendance) {
        error!("Failed to restore attendance ledger: {}", e);
    }
    if let Err(e) = save_overtime(store, &previous.overtime) {
        error!("Failed to restore overtime ledger: {}", e);
    }
    if let Some(profile) = &previous.profile {
        if let Err(e) = save_profile(store, profile) {
            error!("Failed to restore profile: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobTitle, Theme};
    use chrono::NaiveDate;

    fn profile(marker: Option<&str>) -> UserProfile {
        UserProfile {
            name: "Nour".into(),
            job_title: JobTitle::Engineer,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            theme: Theme::Day,
            last_report_month: marker.map(|m| m.parse().unwrap()),
        }
    }

    #[test]
    fn classify_phases() {
        let jan: MonthKey = "2024-01".parse().unwrap();
        let feb: MonthKey = "2024-02".parse().unwrap();
        assert_eq!(classify(&profile(None), jan), RolloverPhase::Initial);
        assert_eq!(classify(&profile(Some("2024-01")), jan), RolloverPhase::Steady);
        assert_eq!(
            classify(&profile(Some("2024-01")), feb),
            RolloverPhase::RolloverDue { stale: jan }
        );
    }
}
