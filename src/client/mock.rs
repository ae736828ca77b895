//! Mock geocoding and air quality clients for testing
//!
//! Responses are scripted per call; once the script runs out the fallback
//! response is repeated.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::models::{AirQualityReport, Coordinates, LocationQuery};
use super::{AirQualityApi, GeocodingApi};
use crate::error::LookupError;

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub geocode: usize,
    pub air_quality: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.geocode + self.air_quality
    }
}

/// Scripted results for one operation
struct Script<T> {
    queued: VecDeque<Result<T, LookupError>>,
    fallback: Result<T, LookupError>,
}

impl<T: Clone> Script<T> {
    fn new(fallback: Result<T, LookupError>) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback,
        }
    }

    fn next(&mut self) -> Result<T, LookupError> {
        self.queued
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Mock client implementing both service traits.
///
/// # Example
/// ```ignore
/// let mock = MockClient::new()
///     .with_coordinates(sao_paulo())
///     .with_geocode_failures(vec![LookupError::GeocodingUnavailable(ServiceFailure::Status(503))]);
/// ```
pub struct MockClient {
    geocode: Arc<Mutex<Script<Coordinates>>>,
    air_quality: Arc<Mutex<Script<AirQualityReport>>>,
    call_count: Arc<Mutex<CallCounts>>,
    /// Queries seen by `geocode`, in order
    captured_queries: Arc<Mutex<Vec<LocationQuery>>>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            geocode: Arc::new(Mutex::new(Script::new(Ok(Coordinates {
                latitude: 0.0,
                longitude: 0.0,
                display_name: "Null Island".to_string(),
                bounding_box: None,
                address: None,
            })))),
            air_quality: Arc::new(Mutex::new(Script::new(Ok(AirQualityReport::default())))),
            call_count: Arc::new(Mutex::new(CallCounts::default())),
            captured_queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coordinates returned by every geocode call
    pub fn with_coordinates(self, coordinates: Coordinates) -> Self {
        self.geocode.try_lock().unwrap().fallback = Ok(coordinates);
        self
    }

    /// Error returned by every geocode call
    pub fn with_geocode_error(self, error: LookupError) -> Self {
        self.geocode.try_lock().unwrap().fallback = Err(error);
        self
    }

    /// Errors returned by the first geocode calls, before the fallback
    pub fn with_geocode_failures(self, errors: Vec<LookupError>) -> Self {
        self.geocode
            .try_lock()
            .unwrap()
            .queued
            .extend(errors.into_iter().map(Err));
        self
    }

    /// Report returned by every air quality call
    pub fn with_report(self, report: AirQualityReport) -> Self {
        self.air_quality.try_lock().unwrap().fallback = Ok(report);
        self
    }

    /// Error returned by every air quality call
    pub fn with_air_quality_error(self, error: LookupError) -> Self {
        self.air_quality.try_lock().unwrap().fallback = Err(error);
        self
    }

    /// Errors returned by the first air quality calls, before the fallback
    pub fn with_air_quality_failures(self, errors: Vec<LookupError>) -> Self {
        self.air_quality
            .try_lock()
            .unwrap()
            .queued
            .extend(errors.into_iter().map(Err));
        self
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    pub async fn captured_queries(&self) -> Vec<LocationQuery> {
        self.captured_queries.lock().await.clone()
    }
}

#[async_trait]
impl GeocodingApi for MockClient {
    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinates, LookupError> {
        self.call_count.lock().await.geocode += 1;
        self.captured_queries.lock().await.push(query.clone());
        self.geocode.lock().await.next()
    }
}

#[async_trait]
impl AirQualityApi for MockClient {
    async fn air_quality(&self, _coordinates: &Coordinates) -> Result<AirQualityReport, LookupError> {
        self.call_count.lock().await.air_quality += 1;
        self.air_quality.lock().await.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceFailure;

    #[tokio::test]
    async fn test_scripted_failures_then_fallback() {
        let mock = MockClient::new().with_geocode_failures(vec![
            LookupError::GeocodingUnavailable(ServiceFailure::Status(503)),
        ]);
        let query = LocationQuery::new("Denver", "CO", None::<String>);

        assert!(mock.geocode(&query).await.is_err());
        assert!(mock.geocode(&query).await.is_ok());

        let counts = mock.call_counts().await;
        assert_eq!(counts.geocode, 2);
        assert_eq!(counts.air_quality, 0);
        assert_eq!(mock.captured_queries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_air_quality_error() {
        let mock = MockClient::new()
            .with_air_quality_error(LookupError::AirQualityUnavailable(ServiceFailure::MissingData));
        let coords = mock
            .geocode(&LocationQuery::new("Denver", "CO", None::<String>))
            .await
            .unwrap();

        assert!(mock.air_quality(&coords).await.is_err());
        assert_eq!(mock.call_counts().await.total(), 2);
    }

    #[tokio::test]
    async fn test_fixed_coordinates_and_report() {
        let mock = MockClient::new()
            .with_coordinates(Coordinates {
                latitude: 39.7392,
                longitude: -104.9903,
                display_name: "Denver, Colorado, United States".to_string(),
                bounding_box: None,
                address: None,
            })
            .with_report(AirQualityReport {
                elevation: Some(1609.0),
                ..Default::default()
            });

        let coords = mock
            .geocode(&LocationQuery::new("Denver", "CO", None::<String>))
            .await
            .unwrap();
        assert_eq!(coords.latitude, 39.7392);

        let report = mock.air_quality(&coords).await.unwrap();
        assert_eq!(report.elevation, Some(1609.0));
    }
}
