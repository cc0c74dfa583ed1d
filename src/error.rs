//! Error types and handling for the `bikecast` dashboard

use thiserror::Error;

/// Main error type for the `bikecast` dashboard
#[derive(Error, Debug)]
pub enum BikecastError {
    /// Transport, status or decoding failure while talking to the forecast provider
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Cache store unavailable or cached entry corrupt (a clean miss is not an error)
    #[error("Cache read error: {message}")]
    CacheRead { message: String },

    /// Cache store unavailable while persisting a freshly fetched series
    #[error("Cache write error: {message}")]
    CacheWrite { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BikecastError {
    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new cache read error
    pub fn cache_read<S: Into<String>>(message: S) -> Self {
        Self::CacheRead {
            message: message.into(),
        }
    }

    /// Create a new cache write error
    pub fn cache_write<S: Into<String>>(message: S) -> Self {
        Self::CacheWrite {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BikecastError::Fetch { .. } => {
                "Unable to retrieve the forecast. Please try again later.".to_string()
            }
            BikecastError::CacheRead { .. } | BikecastError::CacheWrite { .. } => {
                "Forecast cache is unavailable. You may need to clear your cache.".to_string()
            }
            BikecastError::Config { message } => format!("Configuration error: {message}"),
            BikecastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for BikecastError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key as a path segment.
        BikecastError::fetch(err.without_url().to_string())
    }
}
