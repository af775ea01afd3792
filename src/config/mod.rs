//! Persisted user preferences.

use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    currency::{CurrencyCode, LocaleConfig},
    errors::{AutoServeError, Result},
    payment::DEFAULT_LATENCY_MS,
    pricing::{DEFAULT_DEPOSIT_RATE, DEFAULT_GST_RATE},
    utils::paths::{app_data_dir, config_file_in, ensure_dir},
};

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default = "Config::default_gst_rate")]
    pub gst_rate: f64,
    #[serde(default = "Config::default_deposit_rate")]
    pub deposit_rate: f64,
    #[serde(default = "Config::default_payment_latency_ms")]
    pub payment_latency_ms: u64,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_garage_name")]
    pub garage_name: String,
    /// Overrides the data directory; defaults to `$AUTOSERVE_HOME` or `~/.autoserve`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            currency: Self::default_currency(),
            gst_rate: Self::default_gst_rate(),
            deposit_rate: Self::default_deposit_rate(),
            payment_latency_ms: Self::default_payment_latency_ms(),
            backup_retention: Self::default_backup_retention(),
            garage_name: Self::default_garage_name(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        "en-AU".into()
    }

    pub fn default_currency() -> String {
        "AUD".into()
    }

    pub fn default_gst_rate() -> f64 {
        DEFAULT_GST_RATE
    }

    pub fn default_deposit_rate() -> f64 {
        DEFAULT_DEPOSIT_RATE
    }

    pub fn default_payment_latency_ms() -> u64 {
        DEFAULT_LATENCY_MS
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_garage_name() -> String {
        "garage".into()
    }

    pub fn locale_config(&self) -> LocaleConfig {
        LocaleConfig::from_tag(&self.locale)
    }

    pub fn currency_code(&self) -> CurrencyCode {
        CurrencyCode::new(self.currency.clone())
    }

    pub fn payment_latency(&self) -> Duration {
        Duration::from_millis(self.payment_latency_ms)
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(app_data_dir)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.gst_rate) {
            return Err(AutoServeError::Config(format!(
                "gst_rate {} must be within [0, 1)",
                self.gst_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.deposit_rate) {
            return Err(AutoServeError::Config(format!(
                "deposit_rate {} must be within [0, 1]",
                self.deposit_rate
            )));
        }
        if self.currency.trim().len() != 3 {
            return Err(AutoServeError::Config(format!(
                "currency `{}` is not an ISO 4217 code",
                self.currency
            )));
        }
        Ok(())
    }
}

/// Handles persistence of [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Manager for `<base>/config/config.json`.
    pub fn with_base_dir(base: &Path) -> Result<Self> {
        let path = config_file_in(base);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        Ok(Self::new(path))
    }

    pub fn from_env() -> Result<Self> {
        Self::with_base_dir(&app_data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored config, falling back to defaults when no file exists.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| AutoServeError::Config(format!("{}: {err}", self.path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
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
