// src/tracker.rs
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::duty_engine::{
    compute_remaining, compute_status, days_until_month_end, full_month_schedule, month_schedule,
    Countdown, DutyState, ScheduleDay,
};
use crate::error::DutyError;
use crate::ledger::{self, MonthlySummary};
use crate::models::{
    AttendanceRecord, MonthKey, OnboardingInput, OvertimeInput, OvertimeRecord, Theme, UserProfile,
};
use crate::report::{build_report, ExportArtifact, ExportSink, ReportLanguage};
use crate::rollover::{evaluate_rollover, RolloverOutcome};
use crate::store::{load_state, save_attendance, save_overtime, save_profile, KeyValueStore, TrackerState};

/// What the dashboard shows at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutySnapshot {
    pub now: NaiveDateTime,
    pub state: DutyState,
    pub countdown: Countdown,
    pub days_until_month_end: u32,
    pub logged_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub snapshot: Option<DutySnapshot>,
    pub rollover: RolloverOutcome,
}

/// Application state: the persisted entities plus the store, export sink and
/// clock every action goes through.
pub struct DutyTracker<S, E, C> {
    store: S,
    sink: E,
    clock: C,
    language: ReportLanguage,
    state: TrackerState,
}

impl<S, E, C> DutyTracker<S, E, C>
where
    S: KeyValueStore,
    E: ExportSink,
    C: Clock,
{
    pub fn open(store: S, sink: E, clock: C, language: ReportLanguage) -> Self {
        let state = load_state(&store);
        Self {
            store,
            sink,
            clock,
            language,
            state,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.state.profile.as_ref()
    }

    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.state.attendance
    }

    pub fn overtime(&self) -> &[OvertimeRecord] {
        &self.state.overtime
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn require_profile(&self) -> Result<&UserProfile, DutyError> {
        self.state.profile.as_ref().ok_or(DutyError::NotOnboarded)
    }

    pub fn onboard(&mut self, input: OnboardingInput) -> Result<UserProfile, DutyError> {
        if let Some(existing) = &self.state.profile {
            warn!("Onboarding refused: profile for {} already exists", existing.name);
            return Err(DutyError::AlreadyOnboarded(existing.name.clone()));
        }
        let profile = input.validate()?;
        save_profile(&self.store, &profile)?;
        info!(
            "Onboarded {} ({}) with first shift on {}",
            profile.name, profile.job_title, profile.start_date
        );
        self.state.profile = Some(profile.clone());
        Ok(profile)
    }

    pub fn snapshot(&self) -> Result<DutySnapshot, DutyError> {
        let profile = self.require_profile()?;
        let now = self.clock.now();
        let cycle_start = profile.cycle_start();
        Ok(DutySnapshot {
            now,
            state: compute_status(cycle_start, now),
            countdown: compute_remaining(cycle_start, now),
            days_until_month_end: days_until_month_end(now.date()),
            logged_today: ledger::is_logged(&self.state.attendance, now.date()),
        })
    }

    pub fn confirm_attendance(&mut self) -> Result<AttendanceRecord, DutyError> {
        let profile = self.require_profile()?;
        let now = self.clock.now();
        let (updated, record) = ledger::confirm_attendance(profile, &self.state.attendance, now)?;
        save_attendance(&self.store, &updated)?;
        self.state.attendance = updated;
        Ok(record)
    }

    pub fn add_overtime(&mut self, input: OvertimeInput) -> Result<OvertimeRecord, DutyError> {
        self.require_profile()?;
        let draft = match input.validate() {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Overtime entry rejected: {}", e);
                return Err(e);
            }
        };
        let (updated, record) = ledger::record_overtime(&self.state.overtime, draft);
        save_overtime(&self.store, &updated)?;
        self.state.overtime = updated;
        Ok(record)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, DutyError> {
        let profile = self.require_profile()?;
        let updated = UserProfile {
            theme: profile.theme.toggled(),
            ..profile.clone()
        };
        save_profile(&self.store, &updated)?;
        let theme = updated.theme;
        info!("Theme switched to {}", theme);
        self.state.profile = Some(updated);
        Ok(theme)
    }

    pub fn summary(&self) -> Result<MonthlySummary, DutyError> {
        MonthlySummary::from_ledgers(&self.state.attendance, &self.state.overtime)
    }

    /// The month the open ledgers belong to.
    pub fn open_month(&self) -> Result<MonthKey, DutyError> {
        let profile = self.require_profile()?;
        Ok(profile
            .last_report_month
            .unwrap_or_else(|| MonthKey::of(self.clock.now())))
    }

    /// The report the next rollover would export, built from the open ledgers.
    pub fn preview_report(&self) -> Result<ExportArtifact, DutyError> {
        let profile = self.require_profile()?;
        let month = self.open_month()?;
        build_report(
            profile,
            month,
            &self.state.attendance,
            &self.state.overtime,
            self.language,
        )
    }

    /// Exports the open month's report now, without resetting anything.
    pub fn export_report(&self) -> Result<String, DutyError> {
        let artifact = self.preview_report()?;
        let location = self.sink.export(&artifact)?;
        info!("Interim report {} exported to {}", artifact.file_name, location);
        Ok(location)
    }

    pub fn calendar(&self, full: bool) -> Result<Vec<ScheduleDay>, DutyError> {
        let profile = self.require_profile()?;
        let today = self.clock.today();
        let cycle_start = profile.cycle_start();
        Ok(if full {
            full_month_schedule(cycle_start, MonthKey::from_date(today))
        } else {
            month_schedule(cycle_start, today)
        })
    }

    /// One rollover observation at the clock's current time.
    pub fn observe(&mut self) -> Result<RolloverOutcome, DutyError> {
        let now = self.clock.now();
        evaluate_rollover(&mut self.state, &self.store, &self.sink, now, self.language)
    }

    /// Rollover observation followed by a fresh snapshot.
    pub fn tick(&mut self) -> Result<TickReport, DutyError> {
        let rollover = self.observe()?;
        let snapshot = match self.snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(DutyError::NotOnboarded) => None,
            Err(e) => return Err(e),
        };
        if let Some(s) = &snapshot {
            debug!("Tick at {}: {} ({} remaining)", s.now, s.state, s.countdown);
        }
        Ok(TickReport { snapshot, rollover })
    }
}
