//! Configuration management for HomeOps.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Which record store backs the dashboard.
///
/// `Mock` serves the built-in fixture entries and never touches the network.
/// It has to be selected explicitly; missing credentials are an error in
/// `Live` mode rather than a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    #[default]
    Mock,
    Live,
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreMode::Mock => write!(f, "mock"),
            StoreMode::Live => write!(f, "live"),
        }
    }
}

impl FromStr for StoreMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(StoreMode::Mock),
            "live" => Ok(StoreMode::Live),
            other => Err(CoreError::Config(format!(
                "Unknown store mode '{}' (expected 'mock' or 'live')",
                other
            ))),
        }
    }
}

/// Main HomeOps configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Record store backing the dashboard.
    #[serde(default)]
    pub store_mode: StoreMode,
    /// Supabase project URL (required in live mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    /// Supabase anonymous API key (required in live mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_anon_key: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            store_mode: StoreMode::default(),
            supabase_url: None,
            supabase_anon_key: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file (if present), then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) -> CoreResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `HOMEOPS_*` overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(level) = get("HOMEOPS_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(mode) = get("HOMEOPS_STORE_MODE") {
            self.store_mode = mode.parse()?;
        }
        if let Some(url) = get("HOMEOPS_SUPABASE_URL") {
            self.supabase_url = Some(url);
        }
        if let Some(key) = get("HOMEOPS_SUPABASE_ANON_KEY") {
            self.supabase_anon_key = Some(key);
        }
        Ok(())
    }

    /// Check that the selected store mode has what it needs.
    pub fn validate(&self) -> CoreResult<()> {
        if self.store_mode == StoreMode::Live {
            self.supabase_url()?;
            self.supabase_anon_key()?;
        }
        Ok(())
    }

    /// Get the Supabase URL as a parsed URL.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        let raw = self.supabase_url.as_deref().ok_or_else(|| {
            CoreError::Config(
                "Live mode requires supabase_url (or HOMEOPS_SUPABASE_URL)".to_string(),
            )
        })?;
        Url::parse(raw).map_err(CoreError::from)
    }

    /// Get the Supabase anonymous key.
    pub fn supabase_anon_key(&self) -> CoreResult<&str> {
        self.supabase_anon_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Config(
                    "Live mode requires supabase_anon_key (or HOMEOPS_SUPABASE_ANON_KEY)"
                        .to_string(),
                )
            })
    }
}
