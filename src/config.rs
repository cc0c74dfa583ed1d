//! Configuration management for the `bikecast` dashboard
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::{BikecastError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Root configuration structure for the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BikecastConfig {
    /// Forecast provider settings
    pub provider: ProviderConfig,
    /// The single location the dashboard forecasts
    pub location: LocationConfig,
    /// Cache store settings
    pub cache: CacheConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Forecast provider (Dark Sky) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Dark Sky API key
    pub api_key: String,
    /// Base URL of the forecast API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Fixed forecast location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

/// Cache store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory location
    pub location: String,
    /// Namespace prepended to every cache key
    pub prefix: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, `host:port`
    pub addr: String,
    /// Directory holding the dashboard page and its assets
    pub static_dir: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.darksky.net".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 48.75,
            longitude: 2.3,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
            prefix: "bikecast".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("bikecast"))
        .unwrap_or_else(|| PathBuf::from(".cache/bikecast"))
        .to_string_lossy()
        .into_owned()
}

impl BikecastConfig {
    /// Load configuration from the given path, falling back to the default location
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // BIKECAST_PROVIDER__API_KEY and friends
        builder = builder.add_source(
            Environment::with_prefix("BIKECAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| BikecastError::config(format!("Failed to build configuration: {e}")))?;

        settings.try_deserialize().map_err(|e| {
            BikecastError::config(format!(
                "Failed to deserialize configuration from {}: {e}",
                config_file.display()
            ))
        })
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bikecast").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_provider()?;
        self.validate_location()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_provider(&self) -> Result<()> {
        if self.provider.api_key.trim().is_empty() {
            return Err(BikecastError::config(
                "Dark Sky API key is required. Set provider.api_key or BIKECAST_PROVIDER__API_KEY.",
            ));
        }

        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(BikecastError::config(
                "Provider timeout must be between 1 and 300 seconds",
            ));
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(BikecastError::config(
                "Provider base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        let LocationConfig { latitude, longitude } = self.location;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(BikecastError::config(format!(
                "Invalid coordinates: lat={latitude}, lng={longitude}"
            )));
        }
        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(BikecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(BikecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        if self.server.addr.parse::<SocketAddr>().is_err() {
            return Err(BikecastError::config(format!(
                "Invalid server address '{}'. Expected host:port",
                self.server.addr
            )));
        }

        if self.cache.location.is_empty() {
            return Err(BikecastError::config("Cache location cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_config() -> BikecastConfig {
        let mut config = BikecastConfig::default();
        config.provider.api_key = "0123456789abcdef".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = BikecastConfig::default();
        assert_eq!(config.provider.base_url, "https://api.darksky.net");
        assert_eq!(config.provider.timeout_seconds, 30);
        assert_eq!(config.location.latitude, 48.75);
        assert_eq!(config.location.longitude, 2.3);
        assert_eq!(config.cache.prefix, "bikecast");
        assert_eq!(config.server.static_dir, "static");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_requires_api_key() {
        let result = BikecastConfig::default().validate();
        assert!(result.unwrap_err().to_string().contains("API key is required"));
    }

    #[test]
    fn test_validation_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = valid_config();
        config.logging.level = "loud".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_validation_timeout_range() {
        let mut config = valid_config();
        config.provider.timeout_seconds = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_coordinates() {
        let mut config = valid_config();
        config.location.latitude = 91.0;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid coordinates"));
    }

    #[test]
    fn test_validation_server_addr() {
        let mut config = valid_config();
        config.server.addr = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file_keeps_defaults_for_missing_keys() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[provider]\napi_key = \"from-file-key\"\n\n[location]\nlatitude = 45.5\nlongitude = 4.85\n"
        )
        .unwrap();

        let config = BikecastConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.provider.api_key, "from-file-key");
        assert_eq!(config.provider.timeout_seconds, 30);
        assert_eq!(config.location.latitude, 45.5);
        assert_eq!(config.server.addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = BikecastConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("bikecast"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
