// src/config.rs
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::report::ReportLanguage;

pub const ENV_PREFIX: &str = "DUTY_";

fn default_data_dir() -> PathBuf {
    PathBuf::from(".dutycycle")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_tick_secs() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings read from `DUTY_*` environment variables (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    #[serde(default)]
    pub report_language: ReportLanguage,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
            tick_secs: default_tick_secs(),
            report_language: ReportLanguage::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::prefixed(ENV_PREFIX).from_env::<AppConfig>()
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}
