use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config::{Config, ConfigManager},
    core::services::VehicleService,
    currency::{format_currency_value, format_date, CurrencyCode, LocaleConfig},
    domain::Vehicle,
    errors::{AutoServeError, Result},
    storage::{JsonStorage, SnapshotRepository, VehicleRepository},
    time::Clock,
    utils::paths::app_data_dir,
};

const MIN_ID_PREFIX: usize = 4;

/// Configuration and storage resolved for one CLI invocation.
pub struct CliContext {
    config: Config,
    repo: SnapshotRepository<JsonStorage>,
    locale: LocaleConfig,
    currency: CurrencyCode,
}

impl CliContext {
    /// Opens the data directory named by the environment.
    pub fn from_env() -> Result<Self> {
        Self::open(&app_data_dir())
    }

    pub fn open(base: &Path) -> Result<Self> {
        let config = ConfigManager::with_base_dir(base)?.load()?;
        let data_dir: PathBuf = config.data_dir.clone().unwrap_or_else(|| base.to_path_buf());
        let storage = JsonStorage::new(Some(data_dir), Some(config.backup_retention))?;
        let repo = SnapshotRepository::new(storage, config.garage_name.clone());
        Ok(Self {
            locale: config.locale_config(),
            currency: config.currency_code(),
            config,
            repo,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repo(&self) -> &SnapshotRepository<JsonStorage> {
        &self.repo
    }

    pub fn vehicles<C: Clock>(&self, clock: C) -> VehicleService<&SnapshotRepository<JsonStorage>, C> {
        VehicleService::new(&self.repo, clock)
    }

    pub fn money(&self, amount: f64) -> String {
        format_currency_value(amount, &self.currency, &self.locale)
    }

    pub fn date(&self, date: NaiveDate) -> String {
        format_date(&self.locale, date)
    }

    /// Finds a vehicle by full id or by an unambiguous id prefix.
    pub fn find_vehicle(&self, token: &str) -> Result<Vehicle> {
        if let Ok(id) = Uuid::parse_str(token) {
            return self
                .repo
                .get_vehicle(id)?
                .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {id}")));
        }
        let needle = token.to_ascii_lowercase();
        if needle.len() < MIN_ID_PREFIX {
            return Err(AutoServeError::InvalidInput(format!(
                "vehicle id `{token}` is too short, use at least {MIN_ID_PREFIX} characters"
            )));
        }
        let mut matches: Vec<Vehicle> = self
            .repo
            .list_vehicles()?
            .into_iter()
            .filter(|vehicle| vehicle.id.to_string().starts_with(&needle))
            .collect();
        match matches.len() {
            0 => Err(AutoServeError::NotFound(format!("vehicle {token}"))),
            1 => Ok(matches.remove(0)),
            n => Err(AutoServeError::InvalidInput(format!(
                "vehicle id `{token}` matches {n} vehicles"
            ))),
        }
    }
}

/// First eight characters of an id, enough to pass back to [`CliContext::find_vehicle`].
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn finds_vehicle_by_prefix() {
        let dir = tempdir().unwrap();
        let ctx = CliContext::open(dir.path()).unwrap();
        let vehicle = Vehicle::new("Subaru", "Forester", 2016, 98_000);
        ctx.repo().put_vehicle(&vehicle).unwrap();

        let found = ctx.find_vehicle(&short_id(vehicle.id)).unwrap();
        assert_eq!(found.id, vehicle.id);
        assert!(matches!(
            ctx.find_vehicle("abc"),
            Err(AutoServeError::InvalidInput(_))
        ));
        assert!(matches!(
            ctx.find_vehicle(&Uuid::new_v4().to_string()),
            Err(AutoServeError::NotFound(_))
        ));
    }

    #[test]
    fn formats_with_configured_locale() {
        let dir = tempdir().unwrap();
        let ctx = CliContext::open(dir.path()).unwrap();
        assert_eq!(ctx.money(1234.5), "A$1,234.50");
    }
}
