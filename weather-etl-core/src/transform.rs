//! Maps one raw forecast slot onto one [`CanonicalRow`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{CanonicalRow, LocationMetadata, RawForecastInterval, TrackedLocation};

/// Why a single forecast slot was rejected.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed forecast interval: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unparseable forecast timestamp '{0}'")]
    InvalidTimestamp(String),
}

#[derive(Debug, Deserialize)]
struct IntervalFields {
    dt_txt: Option<String>,
    weather: Option<Vec<ConditionFields>>,
    main: Option<MainFields>,
    visibility: Option<f64>,
    wind: Option<WindFields>,
    clouds: Option<CloudFields>,
}

#[derive(Debug, Deserialize)]
struct ConditionFields {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainFields {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindFields {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CloudFields {
    all: Option<f64>,
}

/// Flatten `interval` for `location`.
///
/// Wind and cloud readings default to `0.0` when the provider leaves them
/// out; visibility stays `None`.
pub fn transform(
    interval: &RawForecastInterval,
    location: &TrackedLocation,
    metadata: &LocationMetadata,
) -> Result<CanonicalRow, TransformError> {
    let fields = IntervalFields::deserialize(&interval.0)?;

    let condition = fields
        .weather
        .as_deref()
        .and_then(|conditions| conditions.first())
        .ok_or(TransformError::MissingField("weather"))?;
    let main = fields.main.ok_or(TransformError::MissingField("main"))?;
    let dt_txt = fields.dt_txt.ok_or(TransformError::MissingField("dt_txt"))?;

    let wind = fields.wind.unwrap_or(WindFields {
        speed: None,
        deg: None,
    });

    Ok(CanonicalRow {
        city_name: location.name.clone(),
        country: metadata.country.clone().unwrap_or_default(),
        latitude: location.latitude,
        longitude: location.longitude,
        timestamp: parse_forecast_time(&dt_txt)?,
        weather_main: required(condition.main.clone(), "weather.main")?,
        weather_description: required(condition.description.clone(), "weather.description")?,
        temperature: required(main.temp, "main.temp")?,
        feels_like: required(main.feels_like, "main.feels_like")?,
        temp_min: required(main.temp_min, "main.temp_min")?,
        temp_max: required(main.temp_max, "main.temp_max")?,
        pressure: required(main.pressure, "main.pressure")?,
        humidity: required(main.humidity, "main.humidity")?,
        visibility: fields.visibility,
        wind_speed: wind.speed.unwrap_or(0.0),
        wind_direction: wind.deg.unwrap_or(0.0),
        cloudiness: fields.clouds.and_then(|c| c.all).unwrap_or(0.0),
        sunrise: epoch_to_utc(metadata.sunrise),
        sunset: epoch_to_utc(metadata.sunset),
    })
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, TransformError> {
    value.ok_or(TransformError::MissingField(field))
}

/// `dt_txt` is UTC without an offset, e.g. `2024-05-01 12:00:00`.
fn parse_forecast_time(raw: &str) -> Result<DateTime<Utc>, TransformError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TransformError::InvalidTimestamp(raw.to_string()))
}

/// Zero and absent both mean "unknown".
fn epoch_to_utc(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.filter(|&s| s != 0)
        .and_then(|s| DateTime::from_timestamp(s, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn london() -> TrackedLocation {
        TrackedLocation::new("London", 51.5074, -0.1278).expect("valid location")
    }

    fn metadata() -> LocationMetadata {
        LocationMetadata {
            country: Some("GB".into()),
            sunrise: Some(1714537080),
            sunset: Some(1714590960),
        }
    }

    fn full_interval() -> Value {
        json!({
            "dt": 1714564800,
            "dt_txt": "2024-05-01 12:00:00",
            "weather": [ { "id": 500, "main": "Rain", "description": "light rain" } ],
            "main": {
                "temp": 14.2,
                "feels_like": 13.6,
                "temp_min": 13.9,
                "temp_max": 14.2,
                "pressure": 1012,
                "humidity": 87
            },
            "visibility": 10000,
            "wind": { "speed": 4.1, "deg": 220 },
            "clouds": { "all": 75 }
        })
    }

    fn run(value: Value) -> Result<CanonicalRow, TransformError> {
        transform(&RawForecastInterval(value), &london(), &metadata())
    }

    #[test]
    fn complete_interval_becomes_row() {
        let row = run(full_interval()).expect("complete interval should transform");

        assert_eq!(row.city_name, "London");
        assert_eq!(row.country, "GB");
        assert_eq!(row.latitude, 51.5074);
        assert_eq!(row.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert_eq!(row.weather_main, "Rain");
        assert_eq!(row.weather_description, "light rain");
        assert_eq!(row.humidity, 87.0);
        assert_eq!(row.pressure, 1012.0);
        assert_eq!(row.visibility, Some(10000.0));
        assert_eq!(row.wind_direction, 220.0);
        assert_eq!(row.cloudiness, 75.0);
        assert_eq!(
            row.sunrise,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 4, 18, 0).unwrap())
        );
    }

    #[test]
    fn missing_weather_block_is_rejected() {
        let mut value = full_interval();
        value.as_object_mut().unwrap().remove("weather");

        let err = run(value).unwrap_err();
        assert!(matches!(err, TransformError::MissingField("weather")));
    }

    #[test]
    fn empty_weather_list_is_rejected() {
        let mut value = full_interval();
        value["weather"] = json!([]);

        assert!(matches!(
            run(value).unwrap_err(),
            TransformError::MissingField("weather")
        ));
    }

    #[test]
    fn missing_main_or_timestamp_is_rejected() {
        let mut value = full_interval();
        value.as_object_mut().unwrap().remove("main");
        assert!(matches!(
            run(value).unwrap_err(),
            TransformError::MissingField("main")
        ));

        let mut value = full_interval();
        value.as_object_mut().unwrap().remove("dt_txt");
        assert!(matches!(
            run(value).unwrap_err(),
            TransformError::MissingField("dt_txt")
        ));
    }

    #[test]
    fn missing_measurement_inside_main_names_the_field() {
        let mut value = full_interval();
        value["main"].as_object_mut().unwrap().remove("humidity");

        let err = run(value).unwrap_err();
        assert_eq!(err.to_string(), "missing required field `main.humidity`");
    }

    #[test]
    fn absent_wind_and_clouds_default_to_zero() {
        let mut value = full_interval();
        let obj = value.as_object_mut().unwrap();
        obj.remove("wind");
        obj.remove("clouds");

        let row = run(value).expect("wind and clouds are optional");
        assert_eq!(row.wind_speed, 0.0);
        assert_eq!(row.wind_direction, 0.0);
        assert_eq!(row.cloudiness, 0.0);
    }

    #[test]
    fn absent_visibility_is_null_not_an_error() {
        let mut value = full_interval();
        value.as_object_mut().unwrap().remove("visibility");

        let row = run(value).expect("visibility is optional");
        assert_eq!(row.visibility, None);
    }

    #[test]
    fn zero_sunrise_is_treated_as_absent() {
        let meta = LocationMetadata {
            country: None,
            sunrise: Some(0),
            sunset: None,
        };
        let row = transform(&RawForecastInterval(full_interval()), &london(), &meta)
            .expect("metadata is optional");

        assert_eq!(row.sunrise, None);
        assert_eq!(row.sunset, None);
        assert_eq!(row.country, "");
    }

    #[test]
    fn wrongly_typed_field_is_malformed() {
        let mut value = full_interval();
        value["main"]["temp"] = json!("warm");

        assert!(matches!(run(value).unwrap_err(), TransformError::Malformed(_)));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let mut value = full_interval();
        value["dt_txt"] = json!("tomorrow noon");

        assert!(matches!(
            run(value).unwrap_err(),
            TransformError::InvalidTimestamp(_)
        ));
    }

    #[test]
    fn rfc3339_timestamp_is_accepted() {
        let mut value = full_interval();
        value["dt_txt"] = json!("2024-05-01T15:00:00+03:00");

        let row = run(value).expect("rfc3339 should parse");
        assert_eq!(row.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }
}
