use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};

use crate::{
    config::ProviderConfig,
    model::{ForecastPayload, TrackedLocation},
};

use super::{FetchError, ForecastSource};

/// Client for the OpenWeather 5 day / 3 hour forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    endpoint: String,
    units: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            units: config.units.clone(),
            http: Client::new(),
        }
    }

    fn build_request(&self, location: &TrackedLocation) -> reqwest::Result<Request> {
        self.http
            .get(&self.endpoint)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
            ])
            .build()
    }
}

#[async_trait]
impl ForecastSource for OpenWeatherClient {
    async fn fetch(&self, location: &TrackedLocation) -> Result<ForecastPayload, FetchError> {
        let request = self.build_request(location)?;
        let res = self.http.execute(request).await?;

        let status = res.status();
        let body = res.text().await?;

        decode_response(status, &body)
    }
}

/// Turn a raw HTTP answer into a payload; anything but 2xx is an error.
fn decode_response(status: StatusCode, body: &str) -> Result<ForecastPayload, FetchError> {
    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            body: truncate_body(body),
        });
    }

    Ok(serde_json::from_str(body)?)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
