//! `bikecast` - hourly weather dashboard for planning a ride
//!
//! This library fetches the hourly forecast of one fixed location, keeps it
//! in a TTL cache and turns it into a day/hour grid of graded cells for the
//! dashboard page.

pub mod cache;
pub mod config;
pub mod error;
pub mod forecast_cache;
pub mod telemetry;
pub mod view;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::{CacheLookup, CacheStore, PersistentCache};
pub use config::BikecastConfig;
pub use error::BikecastError;
pub use forecast_cache::{FORECAST_TTL, ForecastCache, hourly_forecast_key};
pub use view::{Cell, DayBucket, Grade, ViewBuilder, ViewGrid};
pub use weather::{DarkSkyClient, DataPoint, ForecastSeries, ForecastSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, BikecastError>;
