use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::{ForecastHorizon, Propagation, StaffingConfig};

pub const TICKETS_PER_AGENT_RANGE: RangeInclusive<i64> = 10..=40;

/// Tool configuration, read from an optional TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub staffing: StaffingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_tickets_csv")]
    pub tickets_csv: PathBuf,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            tickets_csv: default_tickets_csv(),
            timestamp_column: default_timestamp_column(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StaffingSettings {
    #[serde(default = "default_tickets_per_agent")]
    pub tickets_per_agent: i64,
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: u32,
    #[serde(default)]
    pub propagation: Propagation,
}

impl Default for StaffingSettings {
    fn default() -> Self {
        Self {
            tickets_per_agent: default_tickets_per_agent(),
            forecast_horizon: default_forecast_horizon(),
            propagation: Propagation::default(),
        }
    }
}

fn default_tickets_csv() -> PathBuf {
    PathBuf::from("data/support_tickets.csv")
}
fn default_timestamp_column() -> String {
    "created_at".to_string()
}
fn default_model_path() -> PathBuf {
    PathBuf::from("models/load_model.json")
}
fn default_tickets_per_agent() -> i64 {
    20
}
fn default_forecast_horizon() -> u32 {
    1
}

/// Values given on the command line; each one replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub tickets_csv: Option<PathBuf>,
    pub timestamp_column: Option<String>,
    pub model: Option<PathBuf>,
    pub tickets_per_agent: Option<i64>,
    pub forecast_horizon: Option<u32>,
    pub propagation: Option<Propagation>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ForecastError::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml(&raw).map_err(|err| match err {
            ForecastError::InvalidConfig(reason) => {
                ForecastError::InvalidConfig(format!("{}: {reason}", path.display()))
            }
            other => other,
        })?;
        debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| ForecastError::InvalidConfig(err.message().to_string()))
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(value) = overrides.tickets_csv {
            self.data.tickets_csv = value;
        }
        if let Some(value) = overrides.timestamp_column {
            self.data.timestamp_column = value;
        }
        if let Some(value) = overrides.model {
            self.model.path = value;
        }
        if let Some(value) = overrides.tickets_per_agent {
            self.staffing.tickets_per_agent = value;
        }
        if let Some(value) = overrides.forecast_horizon {
            self.staffing.forecast_horizon = value;
        }
        if let Some(value) = overrides.propagation {
            self.staffing.propagation = value;
        }
    }
}

impl StaffingSettings {
    pub fn validate(&self) -> Result<StaffingConfig> {
        if !TICKETS_PER_AGENT_RANGE.contains(&self.tickets_per_agent) {
            return Err(ForecastError::InvalidConfig(format!(
                "tickets per agent must be between {} and {}, got {}",
                TICKETS_PER_AGENT_RANGE.start(),
                TICKETS_PER_AGENT_RANGE.end(),
                self.tickets_per_agent
            )));
        }
        let forecast_horizon = ForecastHorizon::try_from(self.forecast_horizon)?;

        Ok(StaffingConfig {
            tickets_per_agent: self.tickets_per_agent as u32,
            forecast_horizon,
            propagation: self.propagation,
        })
    }
}
