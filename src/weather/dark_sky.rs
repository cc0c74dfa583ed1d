//! Dark Sky forecast client
//!
//! Fetches the hourly block of the Dark Sky forecast endpoint for one
//! coordinate pair. Every other data block is excluded from the request and
//! the hourly range is extended to the full week.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{DataPoint, ForecastSeries, ForecastSource};
use crate::config::ProviderConfig;
use crate::{BikecastError, Result};

const EXCLUDED_BLOCKS: &str = "currently,minutely,daily,alerts,flags";

pub struct DarkSkyClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DarkSkyClient {
    /// Create a new client from the provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("bikecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BikecastError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn forecast_url(&self, api_key: &str, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/forecast/{}/{},{}?exclude={}&extend=hourly&units=si",
            self.base_url, api_key, latitude, longitude, EXCLUDED_BLOCKS
        )
    }
}

#[async_trait]
impl ForecastSource for DarkSkyClient {
    #[instrument(name = "fetch_forecast", level = "debug", skip(self))]
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastSeries> {
        let url = self.forecast_url(
            &urlencoding::encode(&self.api_key),
            latitude,
            longitude,
        );
        debug!(
            "Sending GET request to {}",
            self.forecast_url("<redacted>", latitude, longitude)
        );
        let start_time = Instant::now();

        let response = self.client.get(url).send().await?.error_for_status()?;
        let forecast: Forecast = response.json().await?;
        let series = forecast.into_series()?;

        let elapsed = start_time.elapsed();
        info!(
            "Retrieved {} hourly points in {:.3}s",
            series.len(),
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow forecast response: {:.3}s", elapsed.as_secs_f64());
        }
        if series.is_empty() {
            warn!("Provider returned an empty hourly block");
        }

        Ok(series)
    }
}

/// Forecast response of the Dark Sky API, restricted to what the dashboard reads
#[derive(Debug, Deserialize)]
struct Forecast {
    timezone: String,
    hourly: DataBlock,
}

#[derive(Debug, Deserialize)]
struct DataBlock {
    #[serde(default)]
    data: Vec<RawDataPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataPoint {
    time: i64,
    apparent_temperature: f64,
    #[serde(default)]
    precip_probability: f64,
    wind_speed: f64,
    // Omitted by the provider when there is no wind.
    #[serde(default)]
    wind_bearing: f64,
}

impl Forecast {
    fn into_series(self) -> Result<ForecastSeries> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|_| BikecastError::fetch(format!("Unknown timezone '{}'", self.timezone)))?;

        let points = self
            .hourly
            .data
            .into_iter()
            .map(|raw| {
                let timestamp = DateTime::from_timestamp(raw.time, 0).ok_or_else(|| {
                    BikecastError::fetch(format!("Timestamp out of range: {}", raw.time))
                })?;
                Ok(DataPoint {
                    timestamp,
                    apparent_temperature: raw.apparent_temperature,
                    precip_probability: raw.precip_probability,
                    wind_speed: raw.wind_speed,
                    wind_bearing: raw.wind_bearing,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ForecastSeries::new(timezone, points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: "secret-key".to_string(),
            base_url: base_url.to_string(),
            timeout_seconds: 5,
        }
    }

    fn forecast_body() -> serde_json::Value {
        json!({
            "latitude": 48.75,
            "longitude": 2.3,
            "timezone": "Europe/Paris",
            "hourly": {
                "summary": "Clear throughout the day.",
                "data": [
                    {
                        "time": 1_729_065_600,
                        "apparentTemperature": 18.46,
                        "precipProbability": 0.42,
                        "windSpeed": 3.2,
                        "windBearing": 270.9,
                        "icon": "clear-day"
                    },
                    {
                        "time": 1_729_069_200,
                        "apparentTemperature": 19.1,
                        "windSpeed": 0.0
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_requests_hourly_block_only() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast/secret-key/48.75,2.3"))
            .and(query_param("exclude", EXCLUDED_BLOCKS))
            .and(query_param("extend", "hourly"))
            .and(query_param("units", "si"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DarkSkyClient::new(&provider_config(&mock_server.uri())).unwrap();
        let series = client.fetch(48.75, 2.3).await.unwrap();

        assert_eq!(series.timezone, chrono_tz::Europe::Paris);
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0].timestamp.timestamp(), 1_729_065_600);
        assert_eq!(series.points[0].apparent_temperature, 18.46);
        assert_eq!(series.points[0].precip_probability, 0.42);
        assert_eq!(series.points[0].wind_bearing, 270.9);
    }

    #[tokio::test]
    async fn test_fetch_defaults_omitted_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&mock_server)
            .await;

        let client = DarkSkyClient::new(&provider_config(&mock_server.uri())).unwrap();
        let series = client.fetch(48.75, 2.3).await.unwrap();

        assert_eq!(series.points[1].precip_probability, 0.0);
        assert_eq!(series.points[1].wind_bearing, 0.0);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_fetch_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("daily usage limit exceeded"))
            .mount(&mock_server)
            .await;

        let client = DarkSkyClient::new(&provider_config(&mock_server.uri())).unwrap();
        let result = client.fetch(48.75, 2.3).await;

        assert!(matches!(result, Err(BikecastError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_fetch_error_does_not_expose_api_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let client = DarkSkyClient::new(&provider_config(&mock_server.uri())).unwrap();
        let err = client.fetch(48.75, 2.3).await.unwrap_err();

        assert!(matches!(err, BikecastError::Fetch { .. }));
        assert!(err.to_string().contains("403"));
        assert!(!err.to_string().contains("secret-key"));
        assert!(!err.user_message().contains("secret-key"));
    }

    #[tokio::test]
    async fn test_fetch_empty_hourly_block_is_empty_series() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timezone": "Europe/Paris",
                "hourly": {}
            })))
            .mount(&mock_server)
            .await;

        let client = DarkSkyClient::new(&provider_config(&mock_server.uri())).unwrap();
        let series = client.fetch(48.75, 2.3).await.unwrap();

        assert!(series.is_empty());
        assert_eq!(series.timezone, chrono_tz::Europe::Paris);
    }

    #[tokio::test]
    async fn test_fetch_malformed_payload_is_fetch_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timezone": "Europe/Paris",
                "hourly": { "data": [ { "time": "not a number" } ] }
            })))
            .mount(&mock_server)
            .await;

        let client = DarkSkyClient::new(&provider_config(&mock_server.uri())).unwrap();
        let result = client.fetch(48.75, 2.3).await;

        assert!(matches!(result, Err(BikecastError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_fetch_unknown_timezone_is_fetch_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timezone": "Mars/Olympus_Mons",
                "hourly": { "data": [] }
            })))
            .mount(&mock_server)
            .await;

        let client = DarkSkyClient::new(&provider_config(&mock_server.uri())).unwrap();
        let err = client.fetch(48.75, 2.3).await.unwrap_err();

        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn test_forecast_url_shape() {
        let client = DarkSkyClient::new(&provider_config("https://api.darksky.net/")).unwrap();
        assert_eq!(
            client.forecast_url("key", 48.75, 2.3),
            "https://api.darksky.net/forecast/key/48.75,2.3?exclude=currently,minutely,daily,alerts,flags&extend=hourly&units=si"
        );
    }
}
