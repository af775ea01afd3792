#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use autoserve_core::{
    config::ConfigManager,
    storage::{JsonStorage, SnapshotRepository},
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates an isolated snapshot repository and config manager for each test.
pub fn setup_test_env() -> (SnapshotRepository<JsonStorage>, ConfigManager) {
    let base = temp_base();
    let storage = JsonStorage::new(Some(base.clone()), Some(3)).expect("create json storage backend");
    let repo = SnapshotRepository::new(storage, "test-garage");
    let config_manager =
        ConfigManager::with_base_dir(&base).expect("create config manager for temp dir");
    (repo, config_manager)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
