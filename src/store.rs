// src/store.rs
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::{debug, error, info, warn};

use crate::error::DutyError;
use crate::models::{AttendanceRecord, OvertimeRecord, UserProfile};

pub const PROFILE_KEY: &str = "user-profile";
pub const ATTENDANCE_KEY: &str = "attendance-ledger";
pub const OVERTIME_KEY: &str = "overtime-ledger";

/// String key/value persistence, one entry per key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, DutyError>;
    fn put(&self, key: &str, value: &str) -> Result<(), DutyError>;
}

// --- File Store ---

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, DutyError> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("Store file {} not found.", path.display());
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| DutyError::io(e, format!("reading {}", path.display())))?;
        Ok(Some(text))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), DutyError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| DutyError::io(e, format!("creating {}", self.dir.display())))?;
        let path = self.path_for(key);
        let mut file = File::create(&path)
            .map_err(|e| DutyError::io(e, format!("creating {}", path.display())))?;
        file.write_all(value.as_bytes())
            .map_err(|e| DutyError::io(e, format!("writing {}", path.display())))?;
        debug!("Store entry '{}' saved to {}", key, path.display());
        Ok(())
    }
}

// --- Memory Store ---

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DutyError> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), DutyError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// --- Typed Access ---

/// Reads and decodes one entry. Missing, unreadable or malformed entries all
/// come back as `None`.
pub fn load_entry<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Ok(Some(text)) => match serde_json::from_str::<T>(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Stored entry '{}' is malformed ({}). Treating it as absent.", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            error!("Failed to read stored entry '{}': {}. Treating it as absent.", key, e);
            None
        }
    }
}

pub fn save_entry<T, S>(store: &S, key: &str, value: &T) -> Result<(), DutyError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json_string = serde_json::to_string_pretty(value)?;
    store.put(key, &json_string)
}

/// Everything the tracker persists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    pub profile: Option<UserProfile>,
    pub attendance: Vec<AttendanceRecord>,
    pub overtime: Vec<OvertimeRecord>,
}

pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> TrackerState {
    let state = TrackerState {
        profile: load_entry(store, PROFILE_KEY),
        attendance: load_entry(store, ATTENDANCE_KEY).unwrap_or_default(),
        overtime: load_entry(store, OVERTIME_KEY).unwrap_or_default(),
    };
    info!(
        "State loaded: profile {}, {} attendance records, {} overtime records",
        if state.profile.is_some() { "present" } else { "absent" },
        state.attendance.len(),
        state.overtime.len()
    );
    state
}

pub fn save_profile<S: KeyValueStore + ?Sized>(store: &S, profile: &UserProfile) -> Result<(), DutyError> {
    save_entry(store, PROFILE_KEY, profile)
}

pub fn save_attendance<S: KeyValueStore + ?Sized>(
    store: &S,
    records: &[AttendanceRecord],
) -> Result<(), DutyError> {
    save_entry(store, ATTENDANCE_KEY, records)
}

pub fn save_overtime<S: KeyValueStore + ?Sized>(
    store: &S,
    records: &[OvertimeRecord],
) -> Result<(), DutyError> {
    save_entry(store, OVERTIME_KEY, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, JobTitle, Theme};
    use chrono::NaiveDate;
    use rand::{distributions::Alphanumeric, thread_rng, Rng};
    use rust_decimal_macros::dec;

    fn temp_dir() -> PathBuf {
        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();
        std::env::temp_dir().join(format!("dutycycle-store-test-{}", suffix))
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            name: "Maha".into(),
            job_title: JobTitle::Engineer,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            theme: Theme::Day,
            last_report_month: None,
        }
    }

    #[test]
    fn empty_store_loads_default_state() {
        let store = MemoryStore::new();
        assert_eq!(load_state(&store), TrackerState::default());
    }

    #[test]
    fn malformed_entries_are_treated_as_absent() {
        let store = MemoryStore::new();
        store.put(PROFILE_KEY, "{not json").unwrap();
        store.put(ATTENDANCE_KEY, r#"{"date":"2024-01-01"}"#).unwrap();
        store.put(OVERTIME_KEY, "42").unwrap();
        let state = load_state(&store);
        assert!(state.profile.is_none());
        assert!(state.attendance.is_empty());
        assert!(state.overtime.is_empty());
    }

    #[test]
    fn saved_state_loads_back() {
        let store = MemoryStore::new();
        let profile = sample_profile();
        let attendance = vec![AttendanceRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: AttendanceStatus::Work,
            logged_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }];
        let overtime = vec![OvertimeRecord {
            id: "abc".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            hours: dec!(2.5),
            description: "relay".into(),
        }];
        save_profile(&store, &profile).unwrap();
        save_attendance(&store, &attendance).unwrap();
        save_overtime(&store, &overtime).unwrap();

        let state = load_state(&store);
        assert_eq!(state.profile, Some(profile));
        assert_eq!(state.attendance, attendance);
        assert_eq!(state.overtime, overtime);
    }

    #[test]
    fn file_store_creates_directory_and_round_trips() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir);
        assert_eq!(store.get(PROFILE_KEY).unwrap(), None);

        save_profile(&store, &sample_profile()).unwrap();
        assert!(dir.join("user-profile.json").exists());
        let state = load_state(&store);
        assert_eq!(state.profile, Some(sample_profile()));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("user-profile.json"), "corrupt").unwrap();
        let store = JsonFileStore::new(&dir);
        assert!(load_state(&store).profile.is_none());
        fs::remove_dir_all(&dir).ok();
    }
}
