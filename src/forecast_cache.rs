//! Cache-aside access to the hourly forecast of the configured location

use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::cache::{CacheLookup, CacheStore};
use crate::weather::{ForecastSeries, ForecastSource};
use crate::{BikecastError, Result};

/// How long a fetched series stays in the store
pub const FORECAST_TTL: Duration = Duration::from_secs(60 * 60);

/// Key suffix of the single forecast entry
pub const HOURLY_FORECAST_KEY: &str = "hourly_forecast";

/// Builds the namespaced store key for the hourly forecast
#[must_use]
pub fn hourly_forecast_key(prefix: &str) -> String {
    if prefix.is_empty() {
        HOURLY_FORECAST_KEY.to_string()
    } else {
        format!("{prefix}:{HOURLY_FORECAST_KEY}")
    }
}

/// Serves the forecast from the store, falling back to the provider on a miss.
///
/// Concurrent misses are not coalesced: each one calls the provider and
/// overwrites the entry.
pub struct ForecastCache<S, C> {
    source: S,
    store: C,
    latitude: f64,
    longitude: f64,
}

impl<S: ForecastSource, C: CacheStore> ForecastCache<S, C> {
    pub fn new(source: S, store: C, latitude: f64, longitude: f64) -> Self {
        Self {
            source,
            store,
            latitude,
            longitude,
        }
    }

    /// Returns the series stored under `key`, fetching and storing it on a miss.
    ///
    /// Store failures other than a miss are returned as-is and never fall
    /// through to the provider. A failed write after a successful fetch is
    /// an error too: no data is returned that could not be persisted.
    #[instrument(name = "get_forecast", skip(self))]
    pub async fn get(&self, key: &str) -> Result<ForecastSeries> {
        match self.store.read(key).await {
            CacheLookup::Hit(bytes) => {
                let series: ForecastSeries = postcard::from_bytes(&bytes).map_err(|e| {
                    BikecastError::cache_read(format!("Corrupt forecast entry: {e}"))
                })?;
                debug!("Serving {} cached points", series.len());
                return Ok(series);
            }
            CacheLookup::Failure(err) => return Err(err),
            CacheLookup::Miss => {
                info!("Forecast not cached, calling the provider");
            }
        }

        let series = self.source.fetch(self.latitude, self.longitude).await?;

        let bytes = postcard::to_stdvec(&series)
            .map_err(|e| BikecastError::cache_write(format!("Failed to encode forecast: {e}")))?;
        self.store.write(key, bytes, FORECAST_TTL).await?;
        info!("Cached {} points for {:?}", series.len(), FORECAST_TTL);

        Ok(series)
    }
}
