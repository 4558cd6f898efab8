// src/report.rs
use serde::Deserialize;
use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::{debug, info};

use crate::error::DutyError;
use crate::ledger::MonthlySummary;
use crate::models::{AttendanceRecord, AttendanceStatus, JobTitle, MonthKey, OvertimeRecord, UserProfile};

pub const REPORT_MIME_TYPE: &str = "text/plain;charset=utf-8";
const RULE: &str = "----------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLanguage {
    #[default]
    Arabic,
    English,
}

struct Labels {
    title: &'static str,
    month: &'static str,
    attendance: &'static str,
    overtime: &'static str,
    date: &'static str,
    status: &'static str,
    hours: &'static str,
    details: &'static str,
    work: &'static str,
    off: &'static str,
    engineer: &'static str,
    technician: &'static str,
    no_records: &'static str,
    work_days: &'static str,
    overtime_total: &'static str,
    total_hours: &'static str,
    footer: &'static str,
}

const ARABIC: Labels = Labels {
    title: "تقرير الدوام الشهري",
    month: "الشهر",
    attendance: "سجلات الحضور:",
    overtime: "سجلات الإضافي (Overtime):",
    date: "التاريخ",
    status: "الحالة",
    hours: "الساعات",
    details: "التفاصيل",
    work: "دوام",
    off: "إجازة",
    engineer: "المهندس",
    technician: "الفني",
    no_records: "لا توجد سجلات",
    work_days: "أيام الدوام",
    overtime_total: "ساعات الإضافي",
    total_hours: "إجمالي الساعات",
    footer: "تم توليد التقرير تلقائياً بواسطة dutycycle.",
};

const ENGLISH: Labels = Labels {
    title: "Monthly Duty Report",
    month: "Month",
    attendance: "Attendance records:",
    overtime: "Overtime records:",
    date: "Date",
    status: "Status",
    hours: "Hours",
    details: "Details",
    work: "On duty",
    off: "Off",
    engineer: "Engineer",
    technician: "Technician",
    no_records: "No records",
    work_days: "Work days",
    overtime_total: "Overtime hours",
    total_hours: "Total hours",
    footer: "Generated automatically by dutycycle.",
};

impl ReportLanguage {
    fn labels(self) -> &'static Labels {
        match self {
            ReportLanguage::Arabic => &ARABIC,
            ReportLanguage::English => &ENGLISH,
        }
    }
}

/// Renders the monthly report. Records appear in stored order.
pub fn format_report(
    profile: &UserProfile,
    month: MonthKey,
    attendance: &[AttendanceRecord],
    overtime: &[OvertimeRecord],
    language: ReportLanguage,
) -> Result<String, DutyError> {
    let l = language.labels();
    let job_title = match profile.job_title {
        JobTitle::Engineer => l.engineer,
        JobTitle::Technician => l.technician,
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("{} - {} {}", l.title, job_title, profile.name));
    lines.push(format!("{}: {}", l.month, month));
    lines.push(RULE.to_string());

    lines.push(l.attendance.to_string());
    if attendance.is_empty() {
        lines.push(format!("- {}", l.no_records));
    }
    for record in attendance {
        let status = match record.status {
            AttendanceStatus::Work => l.work,
            AttendanceStatus::Off => l.off,
        };
        lines.push(format!(
            "- {}: {} | {}: {}",
            l.date,
            record.date.format("%Y-%m-%d"),
            l.status,
            status
        ));
    }
    lines.push(String::new());

    lines.push(l.overtime.to_string());
    if overtime.is_empty() {
        lines.push(format!("- {}", l.no_records));
    }
    for record in overtime {
        lines.push(format!(
            "- {}: {} | {}: {} | {}: {}",
            l.date,
            record.date.format("%Y-%m-%d"),
            l.hours,
            record.hours.normalize(),
            l.details,
            record.description
        ));
    }
    lines.push(RULE.to_string());

    let summary = MonthlySummary::from_ledgers(attendance, overtime)?;
    lines.push(format!(
        "{}: {} | {}: {} | {}: {}",
        l.work_days,
        summary.work_days,
        l.overtime_total,
        summary.overtime_hours.normalize(),
        l.total_hours,
        summary.total_hours.normalize()
    ));
    lines.push(l.footer.to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// `Report_<YYYY-MM>_<name>.txt`, with path separators in the name replaced.
pub fn report_file_name(month: MonthKey, name: &str) -> String {
    let safe_name: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("Report_{}_{}.txt", month, safe_name)
}

/// A finished export: what to call it, what it is, and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub content: String,
}

pub fn build_report(
    profile: &UserProfile,
    month: MonthKey,
    attendance: &[AttendanceRecord],
    overtime: &[OvertimeRecord],
    language: ReportLanguage,
) -> Result<ExportArtifact, DutyError> {
    Ok(ExportArtifact {
        file_name: report_file_name(month, &profile.name),
        mime_type: REPORT_MIME_TYPE.to_string(),
        content: format_report(profile, month, attendance, overtime, language)?,
    })
}

/// Destination for finished reports. Returns a description of where the
/// artifact ended up.
pub trait ExportSink {
    fn export(&self, artifact: &ExportArtifact) -> Result<String, DutyError>;
}

/// Writes artifacts into a directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct FileExportSink {
    dir: PathBuf,
}

impl FileExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for FileExportSink {
    fn export(&self, artifact: &ExportArtifact) -> Result<String, DutyError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| DutyError::io(e, format!("creating {}", self.dir.display())))?;
        let path = self.dir.join(&artifact.file_name);
        let mut file = File::create(&path)
            .map_err(|e| DutyError::io(e, format!("creating {}", path.display())))?;
        file.write_all(artifact.content.as_bytes())
            .map_err(|e| DutyError::io(e, format!("writing {}", path.display())))?;
        info!("Report {} ({}) written to {}", artifact.file_name, artifact.mime_type, path.display());
        Ok(path.display().to_string())
    }
}

/// Keeps exported artifacts in memory. Can be switched into a failing mode.
#[derive(Debug, Clone, Default)]
pub struct MemoryExportSink {
    exported: Arc<Mutex<Vec<ExportArtifact>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(|p| p.into_inner()) = failing;
    }

    pub fn exported(&self) -> Vec<ExportArtifact> {
        self.exported.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.exported.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl ExportSink for MemoryExportSink {
    fn export(&self, artifact: &ExportArtifact) -> Result<String, DutyError> {
        if *self.failing.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(DutyError::Export(format!("download of {} was blocked", artifact.file_name)));
        }
        self.exported
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(artifact.clone());
        debug!("Report {} kept in memory", artifact.file_name);
        Ok(format!("memory:{}", artifact.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Yousef".into(),
            job_title: JobTitle::Technician,
            start_date: d("2024-01-01"),
            theme: Theme::Day,
            last_report_month: Some("2024-01".parse().unwrap()),
        }
    }

    fn attendance() -> Vec<AttendanceRecord> {
        vec![
            AttendanceRecord {
                date: d("2024-01-07"),
                status: AttendanceStatus::Work,
                logged_at: d("2024-01-07").and_hms_opt(8, 0, 0).unwrap(),
            },
            AttendanceRecord {
                date: d("2024-01-01"),
                status: AttendanceStatus::Work,
                logged_at: d("2024-01-01").and_hms_opt(8, 0, 0).unwrap(),
            },
        ]
    }

    fn overtime() -> Vec<OvertimeRecord> {
        vec![OvertimeRecord {
            id: "x1".into(),
            date: d("2024-01-08"),
            hours: dec!(2.50),
            description: "transformer inspection".into(),
        }]
    }

    #[test]
    fn english_report_layout() {
        let month = "2024-01".parse().unwrap();
        let text = format_report(&profile(), month, &attendance(), &overtime(), ReportLanguage::English).unwrap();
        let expected = "\
Monthly Duty Report - Technician Yousef
Month: 2024-01
----------------------------------
Attendance records:
- Date: 2024-01-07 | Status: On duty
- Date: 2024-01-01 | Status: On duty

Overtime records:
- Date: 2024-01-08 | Hours: 2.5 | Details: transformer inspection
----------------------------------
Work days: 2 | Overtime hours: 2.5 | Total hours: 50.5
Generated automatically by dutycycle.
";
        assert_eq!(text, expected);
    }

    #[test]
    fn arabic_report_uses_localized_labels() {
        let month = "2024-01".parse().unwrap();
        let text = format_report(&profile(), month, &attendance(), &[], ReportLanguage::Arabic).unwrap();
        assert!(text.starts_with("تقرير الدوام الشهري - الفني Yousef\n"));
        assert!(text.contains("الشهر: 2024-01"));
        assert!(text.contains("- التاريخ: 2024-01-07 | الحالة: دوام"));
        assert!(text.contains("- لا توجد سجلات"));
    }

    #[test]
    fn report_is_deterministic() {
        let month = "2024-01".parse().unwrap();
        let a = build_report(&profile(), month, &attendance(), &overtime(), ReportLanguage::Arabic).unwrap();
        let b = build_report(&profile(), month, &attendance(), &overtime(), ReportLanguage::Arabic).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mime_type, REPORT_MIME_TYPE);
    }

    #[test]
    fn file_name_depends_on_month_and_name() {
        let month = "2024-02".parse().unwrap();
        assert_eq!(report_file_name(month, "Yousef"), "Report_2024-02_Yousef.txt");
        assert_eq!(report_file_name(month, " a/b\\c "), "Report_2024-02_a_b_c.txt");
    }

    #[test]
    fn memory_sink_records_and_fails_on_demand() {
        let sink = MemoryExportSink::new();
        let artifact = ExportArtifact {
            file_name: "r.txt".into(),
            mime_type: REPORT_MIME_TYPE.into(),
            content: "hello".into(),
        };
        assert_eq!(sink.export(&artifact).unwrap(), "memory:r.txt");
        sink.set_failing(true);
        assert!(matches!(sink.export(&artifact), Err(DutyError::Export(_))));
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.exported()[0], artifact);
    }

    #[test]
    fn file_sink_writes_report() {
        let dir = std::env::temp_dir().join(format!(
            "dutycycle-export-test-{}",
            crate::ledger::new_overtime_id(&[])
        ));
        let sink = FileExportSink::new(&dir);
        let artifact = ExportArtifact {
            file_name: "Report_2024-01_Yousef.txt".into(),
            mime_type: REPORT_MIME_TYPE.into(),
            content: "body".into(),
        };
        let location = sink.export(&artifact).unwrap();
        assert_eq!(fs::read_to_string(&location).unwrap(), "body");
        fs::remove_dir_all(&dir).ok();
    }
}
