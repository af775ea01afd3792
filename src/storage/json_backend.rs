use chrono::Utc;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    domain::{garage::CURRENT_SCHEMA_VERSION, Garage},
    errors::{AutoServeError, Result},
    utils::paths::{backup_dir_in, ensure_dir, garage_dir_in, resolve_base},
};

use super::{garage_warnings, StorageBackend};

const SNAPSHOT_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Filesystem-backed JSON persistence for garage snapshots and their backups.
///
/// Layout under the base directory:
/// `garage/<name>.json` for live snapshots and `backups/<name>/<name>_<timestamp>[_note].json`.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    garage_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = resolve_base(root);
        ensure_dir(&root)?;
        let garage_dir = garage_dir_in(&root);
        let backups_dir = backup_dir_in(&root);
        ensure_dir(&garage_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root,
            garage_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn garage_path(&self, name: &str) -> PathBuf {
        self.garage_dir
            .join(format!("{}.{}", canonical_name(name), SNAPSHOT_EXTENSION))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    /// Loads the named snapshot, or returns a fresh garage when none is stored yet.
    pub fn load_or_create(&self, name: &str) -> Result<Garage> {
        if self.exists(name) {
            self.load(name)
        } else {
            debug!(garage = name, "no snapshot on disk, starting empty");
            Ok(Garage::new(name))
        }
    }

    /// Canonical names of every stored snapshot, sorted.
    pub fn list_garages(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.garage_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    fn unique_backup_path(&self, name: &str, note: Option<&str>) -> Result<PathBuf> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let mut path = dir.join(format!("{stem}.{SNAPSHOT_EXTENSION}"));
        let mut counter = 2;
        while path.exists() {
            path = dir.join(format!("{stem}_{counter}.{SNAPSHOT_EXTENSION}"));
            counter += 1;
        }
        Ok(path)
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let backup_path = self.unique_backup_path(name, None)?;
        fs::copy(path, &backup_path)?;
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            debug!(backup = %entry, "pruning backup beyond retention");
            let _ = fs::remove_file(self.backup_path(name, entry));
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, garage: &Garage, name: &str) -> Result<()> {
        let path = self.garage_path(name);
        self.backup_existing_file(name, &path)?;
        save_garage_to_path(garage, &path)?;
        info!(garage = name, path = %path.display(), "garage saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Garage> {
        let path = self.garage_path(name);
        if !path.exists() {
            return Err(AutoServeError::NotFound(format!("garage `{name}`")));
        }
        load_garage_from_path(&path)
    }

    fn exists(&self, name: &str) -> bool {
        self.garage_path(name).exists()
    }

    /// Backup file names, newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        // Fixed-width timestamps follow the shared prefix, so lexical order is chronological.
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }

    fn backup(&self, garage: &Garage, name: &str, note: Option<&str>) -> Result<String> {
        let path = self.unique_backup_path(name, note)?;
        let json = serde_json::to_string_pretty(garage)?;
        write_atomic(&path, &json)?;
        self.prune_backups(name)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| AutoServeError::Storage("backup path has no file name".into()))?;
        info!(garage = name, backup = %file_name, "backup written");
        Ok(file_name)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<Garage> {
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(AutoServeError::Storage(format!(
                "backup `{backup_name}` not found"
            )));
        }
        let garage = load_garage_from_path(&backup_path)?;
        save_garage_to_path(&garage, &self.garage_path(name))?;
        info!(garage = name, backup = backup_name, "backup restored");
        Ok(garage)
    }
}

/// Writes the snapshot by staging to a temporary file and renaming over the target.
pub fn save_garage_to_path(garage: &Garage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(garage)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a snapshot, rejecting schema versions newer than this build understands.
pub fn load_garage_from_path(path: &Path) -> Result<Garage> {
    let data = fs::read_to_string(path)?;
    let garage: Garage = serde_json::from_str(&data)?;
    if garage.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(AutoServeError::Storage(format!(
            "`{}` uses schema version {}, newer than supported {}",
            path.display(),
            garage.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    for warning in garage_warnings(&garage) {
        warn!(path = %path.display(), "{warning}");
    }
    Ok(garage)
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "garage".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Vehicle;
    use tempfile::TempDir;

    fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage =
            JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("json storage");
        (storage, temp)
    }

    fn sample_garage() -> Garage {
        let mut garage = Garage::new("Sample");
        garage.add_vehicle(Vehicle::new("Toyota", "RAV4", 2022, 15_000));
        garage
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        storage.save(&sample_garage(), "household").expect("save");
        let loaded = storage.load("household").expect("load");
        assert_eq!(loaded.name, "Sample");
        assert_eq!(loaded.vehicles.len(), 1);
    }

    #[test]
    fn list_garages_returns_sorted_canonical_names() {
        let (storage, _guard) = storage_with_temp_dir();
        assert!(storage.list_garages().expect("list").is_empty());
        storage.save(&sample_garage(), "Work Fleet").expect("save");
        storage.save(&sample_garage(), "Household").expect("save");
        assert_eq!(
            storage.list_garages().expect("list"),
            vec!["household".to_string(), "work_fleet".to_string()]
        );
    }

    #[test]
    fn canonical_names_are_filesystem_safe() {
        assert_eq!(canonical_name("My Garage!"), "my_garage_");
        assert_eq!(canonical_name("  "), "garage");
    }

    #[test]
    fn backup_note_is_slugged_into_file_name() {
        let (storage, _guard) = storage_with_temp_dir();
        let name = storage
            .backup(&sample_garage(), "family", Some("Before Rego"))
            .expect("backup");
        assert!(name.starts_with("family_"));
        assert!(name.ends_with("_before-rego.json"), "got {name}");
    }

    #[test]
    fn retention_prunes_oldest_backups() {
        let (storage, _guard) = storage_with_temp_dir();
        let garage = sample_garage();
        for _ in 0..5 {
            storage.backup(&garage, "fleet", None).expect("backup");
        }
        assert_eq!(storage.list_backups("fleet").unwrap().len(), 3);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let (storage, _guard) = storage_with_temp_dir();
        let mut garage = sample_garage();
        garage.schema_version = CURRENT_SCHEMA_VERSION + 1;
        save_garage_to_path(&garage, &storage.garage_path("future")).unwrap();
        let err = storage.load("future").expect_err("newer schema");
        assert!(err.to_string().contains("schema version"), "{err}");
    }
}
