use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A fixed geographic point whose forecast is pulled on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl TrackedLocation {
    /// Build a location, rejecting blank names and out-of-range coordinates.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self> {
        let location = Self {
            name: name.into(),
            latitude,
            longitude,
        };
        location.validate()?;
        Ok(location)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("Tracked location name must not be empty"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(anyhow!(
                "Latitude {} for '{}' is outside [-90, 90]",
                self.latitude,
                self.name
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(anyhow!(
                "Longitude {} for '{}' is outside [-180, 180]",
                self.longitude,
                self.name
            ));
        }
        Ok(())
    }
}

/// Per-location block (`city`) of a forecast response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationMetadata {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub sunrise: Option<i64>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub sunset: Option<i64>,
}

/// Epoch seconds may arrive as an integer or a float; fractions are dropped.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    Ok(secs.filter(|s| s.is_finite()).map(|s| s.trunc() as i64))
}

/// `null` decodes the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One 3-hour forecast slot exactly as the provider sent it.
///
/// Kept as untyped JSON so a single malformed slot is rejected by the
/// transformer instead of failing the whole location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawForecastInterval(pub serde_json::Value);

/// Everything one forecast call yields for one location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastPayload {
    #[serde(default, rename = "list", deserialize_with = "null_as_default")]
    pub intervals: Vec<RawForecastInterval>,
    #[serde(default, rename = "city", deserialize_with = "null_as_default")]
    pub metadata: LocationMetadata,
}

/// Flattened row persisted to the destination table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRow {
    pub city_name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub weather_main: String,
    pub weather_description: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub visibility: Option<f64>,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub cloudiness: f64,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}
