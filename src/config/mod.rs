//! Service configuration loaded from YAML

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dispersion::{SimulationInput, SourceLocation};
use crate::environment::{BoundingBox, Location};

/// Top-level configuration for the dispersion service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Emission source every dispersion field is anchored to
    #[serde(default)]
    pub source: SourceLocation,
    /// District the environment feed reports on
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub feed: FeedConfig,
    /// Defaults served by `GET /simulate`
    #[serde(default)]
    pub simulation: SimulationInput,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_air_quality_url")]
    pub air_quality_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_air_quality_domain")]
    pub air_quality_domain: String,
    #[serde(default = "default_past_days")]
    pub past_days: u32,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
    #[serde(default = "default_current_timeout")]
    pub current_timeout_secs: u64,
    #[serde(default = "default_hourly_timeout")]
    pub hourly_timeout_secs: u64,
}

fn default_air_quality_url() -> String {
    "https://air-quality-api.open-meteo.com/v1/air-quality".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_air_quality_domain() -> String {
    "cams_europe".to_string()
}

fn default_past_days() -> u32 {
    7
}

fn default_forecast_days() -> u32 {
    3
}

fn default_current_timeout() -> u64 {
    10
}

fn default_hourly_timeout() -> u64 {
    15
}

impl FeedConfig {
    pub fn current_timeout(&self) -> Duration {
        Duration::from_secs(self.current_timeout_secs)
    }

    pub fn hourly_timeout(&self) -> Duration {
        Duration::from_secs(self.hourly_timeout_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            air_quality_url: default_air_quality_url(),
            forecast_url: default_forecast_url(),
            air_quality_domain: default_air_quality_domain(),
            past_days: default_past_days(),
            forecast_days: default_forecast_days(),
            current_timeout_secs: default_current_timeout(),
            hourly_timeout_secs: default_hourly_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Upper bound on rays × steps accepted by `POST /simulate`
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

fn default_max_points() -> usize {
    5_000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("csv_data")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Save configuration to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Reads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml(path),
            None => Ok(Self::default()),
        }
    }
}
