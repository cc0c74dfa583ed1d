use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::Result;

pub mod dark_sky;

pub use dark_sky::DarkSkyClient;

/// One hourly observation as returned by the forecast provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataPoint {
    /// Start of the hour this point describes
    pub timestamp: DateTime<Utc>,
    /// Apparent ("feels like") temperature in Celsius
    pub apparent_temperature: f64,
    /// Probability of precipitation, between 0 and 1 inclusive
    pub precip_probability: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Wind bearing in degrees, true north at 0
    pub wind_bearing: f64,
}

/// Hourly points of one provider response, ascending by timestamp
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastSeries {
    /// Timezone of the forecast location, used to derive calendar days and clock times
    pub timezone: Tz,
    pub points: Vec<DataPoint>,
}

impl ForecastSeries {
    #[must_use]
    pub fn new(timezone: Tz, points: Vec<DataPoint>) -> Self {
        Self { timezone, points }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Something able to produce the hourly forecast for a coordinate pair.
///
/// One call is one outbound request; implementations do not retry and never
/// return partial results.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastSeries>;
}
