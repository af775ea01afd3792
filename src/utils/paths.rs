use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".autoserve";
const HOME_ENV: &str = "AUTOSERVE_HOME";
const GARAGE_DIR: &str = "garage";
const BACKUP_DIR: &str = "backups";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";

/// Returns the application data directory, defaulting to `~/.autoserve`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Resolves an explicit base directory or falls back to [`app_data_dir`].
pub fn resolve_base(custom: Option<PathBuf>) -> PathBuf {
    custom.unwrap_or_else(app_data_dir)
}

pub fn garage_dir_in(base: &Path) -> PathBuf {
    base.join(GARAGE_DIR)
}

pub fn backup_dir_in(base: &Path) -> PathBuf {
    base.join(BACKUP_DIR)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Creates `path` (and parents) when it does not exist yet.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_base() {
        let base = PathBuf::from("/tmp/autoserve-test");
        assert_eq!(garage_dir_in(&base), base.join("garage"));
        assert_eq!(backup_dir_in(&base), base.join("backups"));
        assert_eq!(
            config_file_in(&base),
            base.join("config").join("config.json")
        );
    }

    #[test]
    fn explicit_base_wins() {
        let custom = PathBuf::from("/srv/autoserve");
        assert_eq!(resolve_base(Some(custom.clone())), custom);
    }
}
