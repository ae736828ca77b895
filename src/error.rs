//! Error types for aircheck

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for aircheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Pipeline step that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Geocoding,
    AirQuality,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Geocoding => f.write_str("geocoding"),
            Operation::AirQuality => f.write_str("air quality lookup"),
        }
    }
}

/// Why an upstream service call failed
#[derive(Debug, Clone, Error)]
pub enum ServiceFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("response is missing the `current` section")]
    MissingData,
}

impl From<reqwest::Error> for ServiceFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceFailure::Transport("Request timed out".to_string())
        } else if err.is_connect() {
            ServiceFailure::Transport("Failed to connect to service".to_string())
        } else {
            ServiceFailure::Transport(err.to_string())
        }
    }
}

/// Errors raised while resolving a location to an air quality result
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("Location not found: \"{query}\". Check the spelling of the city, state and country.")]
    LocationNotFound { query: String },

    #[error("Geocoding service unavailable: {0}")]
    GeocodingUnavailable(ServiceFailure),

    #[error("Air quality service unavailable: {0}")]
    AirQualityUnavailable(ServiceFailure),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetryExhausted {
        operation: Operation,
        attempts: u32,
        #[source]
        source: Box<LookupError>,
    },

    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Flat error discriminant used in event payloads and JSON output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    LocationNotFound,
    GeocodingUnavailable,
    AirQualityUnavailable,
    Validation,
    RetryExhausted,
    Timeout,
}

impl LookupError {
    /// Only connectivity and availability failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LookupError::GeocodingUnavailable(_) | LookupError::AirQualityUnavailable(_)
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::LocationNotFound { .. } => ErrorKind::LocationNotFound,
            LookupError::GeocodingUnavailable(_) => ErrorKind::GeocodingUnavailable,
            LookupError::AirQualityUnavailable(_) => ErrorKind::AirQualityUnavailable,
            LookupError::Validation(_) => ErrorKind::Validation,
            LookupError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            LookupError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Innermost error, unwrapping retry exhaustion.
    pub fn root(&self) -> &LookupError {
        match self {
            LookupError::RetryExhausted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Pipeline step the error belongs to, when known
    pub fn operation(&self) -> Option<Operation> {
        match self {
            LookupError::LocationNotFound { .. } | LookupError::GeocodingUnavailable(_) => {
                Some(Operation::Geocoding)
            }
            LookupError::AirQualityUnavailable(_) => Some(Operation::AirQuality),
            LookupError::RetryExhausted { operation, .. } => Some(*operation),
            LookupError::Validation(_) | LookupError::Timeout { .. } => None,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Durable cache tier errors. Never surfaced from lookups, only from
/// the `cache` management commands.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache entry could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
