use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::{ForecastPayload, TrackedLocation};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Why one location's forecast could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed forecast JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of multi-day forecasts, one call per tracked location.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self, location: &TrackedLocation) -> Result<ForecastPayload, FetchError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Canned responses keyed by location name. Unknown names answer 503.
    #[derive(Debug, Default)]
    pub(crate) struct CannedSource {
        pub payloads: HashMap<String, ForecastPayload>,
    }

    impl CannedSource {
        pub fn with(mut self, name: &str, payload: ForecastPayload) -> Self {
            self.payloads.insert(name.to_string(), payload);
            self
        }
    }

    #[async_trait]
    impl ForecastSource for CannedSource {
        async fn fetch(&self, location: &TrackedLocation) -> Result<ForecastPayload, FetchError> {
            self.payloads
                .get(&location.name)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: "upstream unavailable".to_string(),
                })
        }
    }

    #[test]
    fn status_error_mentions_code_and_body() {
        let err = FetchError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "Invalid API key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "provider answered 401 Unauthorized: Invalid API key"
        );
    }
}
