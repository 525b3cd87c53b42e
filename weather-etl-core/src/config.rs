use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::{model::TrackedLocation, warehouse::TableRef};

pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/forecast";
pub const DEFAULT_UNITS: &str = "metric";
pub const DEFAULT_DATABASE: &str = "weather.duckdb";
pub const DEFAULT_DATASET: &str = "weather";
pub const DEFAULT_TABLE: &str = "forecast_intervals";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "WEATHER_ETL_CONFIG";

/// `[openweather]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenWeatherSection {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub units: Option<String>,
}

/// `[warehouse]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WarehouseSection {
    /// DuckDB database file, or `:memory:`.
    pub database: Option<String>,
    pub dataset: Option<String>,
    pub table: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [openweather]
/// api_key = "..."
///
/// [warehouse]
/// database = "weather.duckdb"
/// dataset = "weather"
/// table = "forecast_intervals"
///
/// [[locations]]
/// name = "London"
/// latitude = 51.5074
/// longitude = -0.1278
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub openweather: OpenWeatherSection,
    #[serde(default)]
    pub warehouse: WarehouseSection,
    #[serde(default)]
    pub locations: Vec<TrackedLocation>,
}

/// Resolved forecast provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub endpoint: String,
    pub units: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            units: DEFAULT_UNITS.to_string(),
        }
    }
}

/// Resolved destination settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseConfig {
    pub database: String,
    pub table: TableRef,
}

/// Immutable, validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct EtlConfig {
    pub provider: ProviderConfig,
    pub warehouse: WarehouseConfig,
    pub locations: Vec<TrackedLocation>,
}

/// Locations tracked when the config file lists none.
pub fn default_locations() -> Vec<TrackedLocation> {
    [
        ("New York", 40.7128, -74.0060),
        ("London", 51.5074, -0.1278),
        ("Tokyo", 35.6762, 139.6503),
        ("Sydney", -33.8688, 151.2093),
    ]
    .into_iter()
    .map(|(name, latitude, longitude)| TrackedLocation {
        name: name.to_string(),
        latitude,
        longitude,
    })
    .collect()
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Path to the config file. `WEATHER_ETL_CONFIG` wins over the platform default.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "weather-etl", "weather-etl")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay credentials and target identifiers from the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENWEATHER_API_KEY") {
            self.openweather.api_key = Some(key);
        }
        if let Some(db) = lookup("WEATHER_ETL_DATABASE") {
            self.warehouse.database = Some(db);
        }
        if let Some(dataset) = lookup("WEATHER_ETL_DATASET") {
            self.warehouse.dataset = Some(dataset);
        }
        if let Some(table) = lookup("WEATHER_ETL_TABLE") {
            self.warehouse.table = Some(table);
        }
    }

    /// Fill defaults and validate into an [`EtlConfig`].
    pub fn resolve(self) -> Result<EtlConfig> {
        let api_key = self
            .openweather
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: set OPENWEATHER_API_KEY or add `api_key` under [openweather] in {}.",
                    Self::config_file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "the config file".to_string())
                )
            })?;

        let provider = ProviderConfig {
            api_key,
            endpoint: self
                .openweather
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            units: self
                .openweather
                .units
                .unwrap_or_else(|| DEFAULT_UNITS.to_string()),
        };

        let warehouse = WarehouseConfig {
            database: non_empty(self.warehouse.database, DEFAULT_DATABASE, "database")?,
            table: TableRef::new(
                non_empty(self.warehouse.dataset, DEFAULT_DATASET, "dataset")?,
                non_empty(self.warehouse.table, DEFAULT_TABLE, "table")?,
            ),
        };

        let locations = if self.locations.is_empty() {
            default_locations()
        } else {
            self.locations
        };
        for location in &locations {
            location.validate()?;
        }

        Ok(EtlConfig {
            provider,
            warehouse,
            locations,
        })
    }
}

fn non_empty(value: Option<String>, default: &str, what: &str) -> Result<String> {
    match value {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(anyhow!("Warehouse {what} must not be empty")),
        Some(v) => Ok(v),
    }
}
