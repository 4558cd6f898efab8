// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dutycycle_core::duty_engine::write_schedule_csv;
use dutycycle_core::{
    run_duty_ticker, AppConfig, Clock, DutySnapshot, DutyTracker, FileExportSink, JobTitle,
    JsonFileStore, OnboardingInput, OvertimeInput, RolloverOutcome, SystemClock,
};

type Tracker = DutyTracker<JsonFileStore, FileExportSink, SystemClock>;

#[derive(Parser)]
#[command(name = "dutycycle")]
#[command(version)]
#[command(about = "Tracks a 24h-on / 48h-off duty cycle, attendance and overtime", long_about = None)]
struct Cli {
    /// Directory holding the persisted profile and ledgers
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory monthly reports are written to
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum JobTitleArg {
    Engineer,
    Technician,
}

impl From<JobTitleArg> for JobTitle {
    fn from(arg: JobTitleArg) -> Self {
        match arg {
            JobTitleArg::Engineer => JobTitle::Engineer,
            JobTitleArg::Technician => JobTitle::Technician,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the profile
    Onboard {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, value_enum)]
        job_title: JobTitleArg,
        /// Date of the first work shift (YYYY-MM-DD)
        #[arg(short, long)]
        start_date: String,
    },
    /// Current duty state and countdown
    Status,
    /// Confirm attendance for today's shift
    Attend,
    /// List this month's attendance
    Attendance,
    /// Record or list overtime
    Overtime {
        #[command(subcommand)]
        action: OvertimeCommand,
    },
    /// Duty calendar for the current month
    Calendar {
        /// Show the whole month instead of the remaining days
        #[arg(long)]
        full: bool,
        /// Write the calendar as CSV instead of printing it
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Work days, overtime and total hours so far this month
    Summary,
    /// Print the report for the open month
    Report {
        /// Also write it to the export directory
        #[arg(long)]
        export: bool,
    },
    /// Switch between day and night theme
    Theme,
    /// Keep ticking: live status plus month rollover
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
}

#[derive(Subcommand)]
enum OvertimeCommand {
    Add {
        #[arg(long)]
        hours: String,
        /// Defaults to today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    List,
}

fn print_snapshot(snapshot: &DutySnapshot) {
    println!(
        "{} | {} | next change in {} | {} days until report{}",
        snapshot.now.format("%Y-%m-%d %H:%M:%S"),
        snapshot.state,
        snapshot.countdown,
        snapshot.days_until_month_end,
        if snapshot.logged_today { " | attendance logged" } else { "" }
    );
}

fn print_rollover(outcome: &RolloverOutcome) {
    if let RolloverOutcome::RolledOver { closed, opened, export } = outcome {
        match export {
            Ok(location) => println!("Month {} closed, report saved to {}. Now tracking {}.", closed, location, opened),
            Err(e) => println!("Month {} closed but the report could not be saved ({}). Now tracking {}.", closed, e, opened),
        }
    }
}

async fn run(command: Commands, tracker: &mut Tracker, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Onboard { name, job_title, start_date } => {
            let profile = tracker.onboard(OnboardingInput {
                name,
                job_title: job_title.into(),
                start_date,
            })?;
            tracker.observe().context("monthly rollover check failed")?;
            println!("Welcome {} {}. First shift: {}", profile.job_title, profile.name, profile.start_date);
        }
        Commands::Status => {
            let profile = tracker.profile().cloned().context("no profile, run `onboard` first")?;
            println!("{} {} (theme: {})", profile.job_title, profile.name, profile.theme);
            print_snapshot(&tracker.snapshot()?);
        }
        Commands::Attend => {
            let record = tracker.confirm_attendance()?;
            println!("Attendance confirmed for {}", record.date);
        }
        Commands::Attendance => {
            if tracker.attendance().is_empty() {
                println!("No attendance recorded this month.");
            }
            for record in tracker.attendance() {
                println!("{} | {:?} | logged {}", record.date, record.status, record.logged_at);
            }
        }
        Commands::Overtime { action } => match action {
            OvertimeCommand::Add { hours, date, description } => {
                let date = date.unwrap_or_else(|| tracker.clock().today().format("%Y-%m-%d").to_string());
                let record = tracker.add_overtime(OvertimeInput {
                    date: Some(date),
                    hours,
                    description,
                })?;
                println!("Overtime {} recorded: {}h on {}", record.id, record.hours, record.date);
            }
            OvertimeCommand::List => {
                if tracker.overtime().is_empty() {
                    println!("No overtime recorded this month.");
                }
                for record in tracker.overtime() {
                    println!("{} | {} | {}h | {}", record.id, record.date, record.hours.normalize(), record.description);
                }
            }
        },
        Commands::Calendar { full, csv } => {
            let days = tracker.calendar(full)?;
            match csv {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    write_schedule_csv(&days, file)?;
                    println!("Calendar written to {}", path.display());
                }
                None => {
                    for day in &days {
                        println!("{} {} {}", day.date, day.weekday, day.state);
                    }
                }
            }
        }
        Commands::Summary => {
            let summary = tracker.summary()?;
            println!(
                "Work days: {} | Overtime hours: {} | Total hours: {}",
                summary.work_days,
                summary.overtime_hours.normalize(),
                summary.total_hours.normalize()
            );
        }
        Commands::Report { export } => {
            let artifact = tracker.preview_report()?;
            print!("{}", artifact.content);
            if export {
                let location = tracker.export_report()?;
                println!("Saved to {}", location);
            }
        }
        Commands::Theme => {
            let theme = tracker.toggle_theme()?;
            println!("Theme is now {}", theme);
        }
        Commands::Watch { ticks } => {
            let ran = run_duty_ticker(tracker, config.tick_period(), ticks, |report| {
                print_rollover(&report.rollover);
                if let Some(snapshot) = &report.snapshot {
                    print_snapshot(snapshot);
                }
            })
            .await;
            info!("Watch finished after {} ticks", ran);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to read DUTY_* configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.export_dir {
        config.export_dir = dir;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;
    info!("Using data directory {}", config.data_dir.display());

    let mut tracker = DutyTracker::open(
        JsonFileStore::new(&config.data_dir),
        FileExportSink::new(&config.export_dir),
        SystemClock,
        config.report_language,
    );

    let outcome = tracker.observe().context("monthly rollover check failed")?;
    print_rollover(&outcome);
    run(cli.command, &mut tracker, &config).await
}
