//! Upstream service clients

use async_trait::async_trait;

use crate::error::LookupError;

pub mod air_quality;
pub mod geocoding;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod rate_limit;

pub use air_quality::{DEFAULT_AIR_QUALITY_URL, OpenMeteoClient};
pub use geocoding::{DEFAULT_GEOCODING_URL, NominatimClient};
#[cfg(test)]
#[allow(unused_imports)]
pub use mock::MockClient;

use models::{AirQualityReport, Coordinates, LocationQuery};

/// Resolves a location query to coordinates
#[async_trait]
pub trait GeocodingApi: Send + Sync {
    /// Look up the best match for `query`.
    ///
    /// An empty result set is [`LookupError::LocationNotFound`]; HTTP and
    /// transport failures are [`LookupError::GeocodingUnavailable`].
    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinates, LookupError>;
}

/// Fetches current pollutant readings for a point
#[async_trait]
pub trait AirQualityApi: Send + Sync {
    async fn air_quality(&self, coordinates: &Coordinates) -> Result<AirQualityReport, LookupError>;
}
