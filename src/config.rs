use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::constants::DEFAULT_BASE_URL;
use crate::api::resilience::{LogLevel, ResilienceConfig};

const APP_DIR: &str = "hubspot-crm";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub portal_id: Option<u64>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Transport timeouts in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_connect_timeout")]
    pub connect: u64,
    #[serde(default = "default_read_timeout")]
    pub read: u64,
    #[serde(default = "default_write_timeout")]
    pub write: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    30
}

fn default_write_timeout() -> u64 {
    30
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: default_connect_timeout(),
            read: default_read_timeout(),
            write: default_write_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            portal_id: None,
            client_secret: None,
            base_url: default_base_url(),
            timeouts: Timeouts::default(),
            log_level: default_log_level(),
            max_retries: default_max_retries(),
        }
    }
}

impl Config {
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join(APP_DIR)
        } else {
            // Dot directory in home on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(format!(".{}", APP_DIR))
        };

        Ok(config_dir)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    /// Load the user config file; a missing file yields defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        if !path.exists() {
            info!("Config file {:?} doesn't exist, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        debug!("Loaded config (configured: {})", config.is_configured());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_dir = Self::get_config_dir()?;
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        self.save_to(&config_dir.join("config.toml"))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", path);

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Defaults overridden by `.env` and `HUBSPOT_*` environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::default().apply_env(env_var)
    }

    /// Config file first, then environment overrides
    pub fn load_with_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load()?.apply_env(env_var)
    }

    /// Override fields from a variable lookup; blank values are ignored
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("HUBSPOT_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(portal_id) = var("HUBSPOT_PORTAL_ID") {
            self.portal_id = Some(
                portal_id
                    .trim()
                    .parse()
                    .with_context(|| format!("HUBSPOT_PORTAL_ID must be numeric, got '{}'", portal_id))?,
            );
        }
        if let Some(secret) = var("HUBSPOT_CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
        if let Some(base_url) = var("HUBSPOT_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(level) = var("HUBSPOT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(retries) = var("HUBSPOT_MAX_RETRIES") {
            self.max_retries = retries
                .trim()
                .parse()
                .with_context(|| format!("HUBSPOT_MAX_RETRIES must be a number, got '{}'", retries))?;
        }

        for (name, slot) in [
            ("HUBSPOT_CONNECT_TIMEOUT", &mut self.timeouts.connect),
            ("HUBSPOT_READ_TIMEOUT", &mut self.timeouts.read),
            ("HUBSPOT_WRITE_TIMEOUT", &mut self.timeouts.write),
        ] {
            if let Some(seconds) = var(name) {
                *slot = seconds
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", name, seconds))?;
            }
        }

        Ok(self)
    }

    pub fn is_configured(&self) -> bool {
        self.access_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// Parsed log level; unknown values fall back to info
    pub fn log_level(&self) -> LogLevel {
        self.log_level.parse().unwrap_or_else(|err| {
            warn!("{}, falling back to info", err);
            LogLevel::Info
        })
    }

    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig::builder()
            .max_retries(self.max_retries)
            .connect_timeout(Duration::from_secs(self.timeouts.connect))
            .read_timeout(Duration::from_secs(self.timeouts.read))
            .write_timeout(Duration::from_secs(self.timeouts.write))
            .log_level(self.log_level())
            .build()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
