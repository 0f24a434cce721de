//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration, one YAML file per deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatrolConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub line: LineConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "patrol".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the four JSON record collections.
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: ".patrol/data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local wall-clock time of the daily assignment run, "HH:MM".
    pub daily_at: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_at: "08:30".to_string(),
        }
    }
}

impl ScheduleConfig {
    pub fn daily_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.daily_at, "%H:%M").map_err(|_| {
            ConfigError::Invalid(format!(
                "schedule.daily_at '{}' is not a HH:MM time",
                self.daily_at
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Role labels offered during sign-up, in menu order.
    pub roles: Vec<String>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            roles: vec!["維修員".to_string(), "管理員".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Factory names installed when the factory collection is empty.
    pub factories: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            factories: vec![
                "北區廠".to_string(),
                "中區廠".to_string(),
                "南區廠".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineConfig {
    #[serde(default)]
    pub channel_access_token: String,
    #[serde(default)]
    pub channel_secret: String,
}

impl LineConfig {
    /// Without a token the server falls back to the log dispatcher.
    pub fn is_configured(&self) -> bool {
        !self.channel_access_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Load full configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<PatrolConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from YAML text.
pub fn parse_config(content: &str) -> Result<PatrolConfig, ConfigError> {
    let config: PatrolConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &PatrolConfig) -> Result<(), ConfigError> {
    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.store.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "store.data_dir must not be empty".to_string(),
        ));
    }

    config.schedule.daily_time()?;

    if config.registration.roles.is_empty() {
        return Err(ConfigError::Invalid(
            "registration.roles must not be empty".to_string(),
        ));
    }
    for role in &config.registration.roles {
        if role.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "registration.roles[] must not contain empty labels".to_string(),
            ));
        }
    }

    Ok(())
}
