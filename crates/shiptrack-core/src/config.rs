//! Application configuration management.
//!
//! Settings come from `~/.config/shiptrack/config.json`, then `SHIPTRACK_*`
//! environment variables (a `.env` file is loaded by the binary), then
//! command line flags. `Config::resolve` fills defaults and checks that a
//! store URL is present.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_TTL_SECS;

/// Application name used for config directory paths
const APP_NAME: &str = "shiptrack";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Spreadsheet tab holding the shipment rows
pub const DEFAULT_TAB: &str = "Shipments";

/// Interval of the background refresh ticker
pub const DEFAULT_REFRESH_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "SHIPTRACK_BASE_URL";
pub const ENV_TAB: &str = "SHIPTRACK_TAB";
pub const ENV_CACHE_TTL_SECS: &str = "SHIPTRACK_CACHE_TTL_SECS";
pub const ENV_REFRESH_SECS: &str = "SHIPTRACK_REFRESH_SECS";
pub const ENV_LOG_DIR: &str = "SHIPTRACK_LOG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub tab: Option<String>,
    pub cache_ttl_secs: Option<i64>,
    pub refresh_interval_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub tab: String,
    pub cache_ttl: chrono::Duration,
    pub refresh_interval: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Overlay `SHIPTRACK_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay variables from `lookup`. Empty values are ignored.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
        if let Some(tab) = var(ENV_TAB) {
            self.tab = Some(tab);
        }
        if let Some(ttl) = var(ENV_CACHE_TTL_SECS) {
            let secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_CACHE_TTL_SECS))?;
            self.cache_ttl_secs = Some(secs);
        }
        if let Some(interval) = var(ENV_REFRESH_SECS) {
            let secs = interval
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_REFRESH_SECS))?;
            self.refresh_interval_secs = Some(secs);
        }
        if let Some(dir) = var(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn resolve(&self) -> Result<Settings> {
        let base_url = match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => bail!(
                "No store URL configured - set {} or base_url in the config file",
                ENV_BASE_URL
            ),
        };

        let tab = self
            .tab
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TAB)
            .to_string();

        let ttl_secs = self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS);
        if ttl_secs <= 0 {
            bail!("Cache TTL must be positive, got {}s", ttl_secs);
        }

        let refresh_secs = self.refresh_interval_secs.unwrap_or(DEFAULT_REFRESH_SECS);
        if refresh_secs == 0 {
            bail!("Refresh interval must be at least one second");
        }

        Ok(Settings {
            base_url,
            tab,
            cache_ttl: chrono::Duration::seconds(ttl_secs),
            refresh_interval: Duration::from_secs(refresh_secs),
            log_dir: self.log_dir.clone(),
        })
    }
}
