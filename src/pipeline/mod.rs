//! Lookup pipeline
//!
//! [`AirQualityService`] turns a [`LocationQuery`] into an
//! [`AirQualityResult`]: cache check, geocode, air quality fetch, cache
//! write. Each network step is retried on its own, and lifecycle events are
//! published on the bus so the UI never calls the service directly.

pub mod retry;

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use log::debug;

use crate::aqi::{self, AirQualityResult};
use crate::cache::{ResultCache, normalize_key};
use crate::client::models::{DEFAULT_COUNTRY, LocationQuery};
use crate::client::{AirQualityApi, GeocodingApi};
use crate::error::{LookupError, Operation};
use crate::events::{
    DataSource, ErrorInfo, Event, EventBus, EventKind, SubscribeOptions, Subscription,
};

pub use retry::{RetryPolicy, with_retry};

/// Publishes `loading-end` when a lookup finishes, however it finishes.
struct LoadingGuard<'a> {
    bus: &'a EventBus,
    query: LocationQuery,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.bus.publish(&Event::LoadingEnd {
            query: self.query.clone(),
        });
    }
}

/// Orchestrates a single air quality lookup
pub struct AirQualityService {
    geocoder: Arc<dyn GeocodingApi>,
    air_quality: Arc<dyn AirQualityApi>,
    cache: Arc<ResultCache<AirQualityResult>>,
    bus: EventBus,
    retry: RetryPolicy,
    ttl: Duration,
    timeout: Option<Duration>,
    default_country: String,
}

impl AirQualityService {
    pub fn new(
        geocoder: Arc<dyn GeocodingApi>,
        air_quality: Arc<dyn AirQualityApi>,
        cache: Arc<ResultCache<AirQualityResult>>,
        bus: EventBus,
    ) -> Self {
        let ttl = cache.default_ttl();
        Self {
            geocoder,
            air_quality,
            cache,
            bus,
            retry: RetryPolicy::default(),
            ttl,
            timeout: None,
            default_country: DEFAULT_COUNTRY.to_string(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// TTL for results written by this service (defaults to the cache's)
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Overall limit on the network portion of a lookup
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = country.into();
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache<AirQualityResult>> {
        &self.cache
    }

    fn cache_key(&self, query: &LocationQuery) -> String {
        normalize_key(query, &self.default_country)
    }

    /// Cached result for `query`, if one is still fresh
    pub fn cached(&self, query: &LocationQuery) -> Option<AirQualityResult> {
        self.cache.get(&self.cache_key(query))
    }

    /// Resolve `query` to an air quality result.
    ///
    /// Publishes `data-retrieved(cache)` on a hit. On a miss publishes
    /// `loading-start`, then either `data-cached`, `data-retrieved(api)` and
    /// `success`, or `error`. `loading-end` follows on every path.
    pub async fn get_air_quality_data(
        &self,
        query: &LocationQuery,
    ) -> Result<AirQualityResult, LookupError> {
        let query = query.clone().with_default_country(&self.default_country);
        let key = self.cache_key(&query);
        let _loading = LoadingGuard {
            bus: &self.bus,
            query: query.clone(),
        };

        if let Some(result) = self.cache.get(&key) {
            debug!("Serving {} from cache", key);
            self.bus
                .publish_async(Event::DataRetrieved {
                    key,
                    source: DataSource::Cache,
                })
                .await;
            return Ok(result);
        }

        debug!("Cache miss: {}", key);
        self.bus
            .publish_async(Event::LoadingStart {
                query: query.clone(),
            })
            .await;

        let outcome = match self.timeout {
            Some(after) => tokio::time::timeout(after, self.fetch(&query))
                .await
                .unwrap_or(Err(LookupError::Timeout { after })),
            None => self.fetch(&query).await,
        };

        match outcome {
            Ok(result) => {
                self.cache.set_with_ttl(&key, result.clone(), self.ttl);
                self.bus
                    .publish_async(Event::DataCached { key: key.clone() })
                    .await;
                self.bus
                    .publish_async(Event::DataRetrieved {
                        key,
                        source: DataSource::Api,
                    })
                    .await;
                self.bus
                    .publish_async(Event::Success(Arc::new(result.clone())))
                    .await;
                Ok(result)
            }
            Err(error) => {
                let info = ErrorInfo::new(error.clone(), query, key);
                self.bus.publish_async(Event::Error(Arc::new(info))).await;
                Err(error)
            }
        }
    }

    /// Network portion of a lookup: geocode, then fetch, each with retry.
    async fn fetch(&self, query: &LocationQuery) -> Result<AirQualityResult, LookupError> {
        let coordinates = with_retry(Operation::Geocoding, &self.retry, || {
            self.geocoder.geocode(query)
        })
        .await?;
        debug!(
            "Resolved {} to ({}, {})",
            query, coordinates.latitude, coordinates.longitude
        );

        let report = with_retry(Operation::AirQuality, &self.retry, || {
            self.air_quality.air_quality(&coordinates)
        })
        .await?;

        Ok(aqi::assess(&report, coordinates, query.clone(), Utc::now()))
    }

    /// Handle `submit` events published on `bus` by running a lookup.
    ///
    /// Outcomes travel back over this service's own bus. The subscription
    /// holds only a weak reference, so it lapses once the service is dropped.
    pub fn bind(self: &Arc<Self>, bus: &EventBus) -> Subscription {
        let service: Weak<Self> = Arc::downgrade(self);
        bus.subscribe_async(
            EventKind::Submit,
            move |event| {
                let service = service.clone();
                async move {
                    let (Some(service), Event::Submit(query)) = (service.upgrade(), event) else {
                        return Ok(());
                    };
                    // Failures are already published on the `error` event
                    let _ = service.get_air_quality_data(&query).await;
                    Ok(())
                }
            },
            SubscribeOptions::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::Classification;
    use crate::client::mock::MockClient;
    use crate::client::{NominatimClient, OpenMeteoClient};
    use crate::error::{ErrorKind, ServiceFailure};
    use mockito::Matcher;
    use std::sync::Mutex;

    const SAO_PAULO_GEOCODE: &str = r#"[{
        "lat": "-23.5505",
        "lon": "-46.6333",
        "display_name": "São Paulo, Brasil",
        "address": {"city": "São Paulo", "country": "Brasil"}
    }]"#;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    fn sao_paulo() -> LocationQuery {
        LocationQuery::new("São Paulo", "SP", Some("Brasil"))
    }

    fn report_body(current: &str) -> String {
        format!(
            r#"{{"latitude": -23.55, "longitude": -46.63, "elevation": 760.0,
                "timezone": "America/Sao_Paulo",
                "current_units": {{"pm2_5": "μg/m³"}},
                "current": {}}}"#,
            current
        )
    }

    /// Service over real HTTP clients pointed at a mock server
    fn http_service(server: &mockito::Server, bus: EventBus) -> AirQualityService {
        let geocoder = NominatimClient::new(format!("{}/search", server.url()))
            .unwrap()
            .with_rate_limit(0.0);
        let air = OpenMeteoClient::new(format!("{}/v1/air-quality", server.url())).unwrap();
        AirQualityService::new(
            Arc::new(geocoder),
            Arc::new(air),
            Arc::new(ResultCache::in_memory(10, Duration::from_secs(600))),
            bus,
        )
        .with_retry_policy(fast_retry())
    }

    fn mock_service(mock: Arc<MockClient>, bus: EventBus) -> AirQualityService {
        AirQualityService::new(
            mock.clone(),
            mock,
            Arc::new(ResultCache::in_memory(10, Duration::from_secs(600))),
            bus,
        )
        .with_retry_policy(fast_retry())
    }

    /// Record the name of every event published on `bus`
    fn record_events(bus: &EventBus) -> Arc<Mutex<Vec<&'static str>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::LoadingStart,
            EventKind::LoadingEnd,
            EventKind::Success,
            EventKind::Error,
            EventKind::DataCached,
            EventKind::DataRetrieved,
        ] {
            let log = log.clone();
            bus.subscribe(
                kind,
                move |event| {
                    log.lock().unwrap().push(event.kind().name());
                    Ok(())
                },
                SubscribeOptions::default(),
            );
        }
        log
    }

    async fn geocode_mock(server: &mut mockito::Server, body: &str, hits: usize) -> mockito::Mock {
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    async fn air_mock(server: &mut mockito::Server, body: &str, hits: usize) -> mockito::Mock {
        server
            .mock("GET", "/v1/air-quality")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_scenario_a_good_air() {
        let mut server = mockito::Server::new_async().await;
        let geo = geocode_mock(&mut server, SAO_PAULO_GEOCODE, 1).await;
        let air = air_mock(
            &mut server,
            &report_body(r#"{"time": "2024-05-01T12:00", "european_aqi": 15, "pm2_5": 4.0, "pm10": 8.0}"#),
            1,
        )
        .await;

        let service = http_service(&server, EventBus::new());
        let result = service.get_air_quality_data(&sao_paulo()).await.unwrap();

        geo.assert_async().await;
        air.assert_async().await;
        assert_eq!(result.aqi_value, Some(15.0));
        assert_eq!(result.classification, Classification::Good);
        assert_eq!(result.coordinates.latitude, -23.5505);
        assert_eq!(result.coordinates.longitude, -46.6333);
        assert_eq!(result.location, sao_paulo());
        assert!(result.dominant_pollutant.is_some());
    }

    #[tokio::test]
    async fn test_scenario_b_moderate_air() {
        let mut server = mockito::Server::new_async().await;
        geocode_mock(&mut server, SAO_PAULO_GEOCODE, 1).await;
        air_mock(&mut server, &report_body(r#"{"us_aqi": 65}"#), 1).await;

        let service = http_service(&server, EventBus::new());
        let result = service.get_air_quality_data(&sao_paulo()).await.unwrap();

        assert_eq!(result.aqi_scale, aqi::AqiScale::Us);
        assert_eq!(result.classification, Classification::Moderate);
    }

    #[tokio::test]
    async fn test_scenario_c_missing_current_section() {
        let mut server = mockito::Server::new_async().await;
        geocode_mock(&mut server, SAO_PAULO_GEOCODE, 1).await;
        // Missing data is retryable, so every attempt hits the service
        let air = air_mock(&mut server, r#"{"latitude": -23.55}"#, 3).await;

        let service = http_service(&server, EventBus::new());
        let err = service.get_air_quality_data(&sao_paulo()).await.unwrap_err();

        air.assert_async().await;
        assert_eq!(err.kind(), ErrorKind::RetryExhausted);
        assert_eq!(err.operation(), Some(Operation::AirQuality));
        assert!(matches!(
            err.root(),
            LookupError::AirQualityUnavailable(ServiceFailure::MissingData)
        ));
    }

    #[tokio::test]
    async fn test_scenario_d_empty_geocode_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let geo = geocode_mock(&mut server, "[]", 1).await;
        let air = air_mock(&mut server, &report_body("{}"), 0).await;

        let service = http_service(&server, EventBus::new());
        let err = service.get_air_quality_data(&sao_paulo()).await.unwrap_err();

        geo.assert_async().await;
        air.assert_async().await;
        assert_eq!(err.kind(), ErrorKind::LocationNotFound);
    }

    #[tokio::test]
    async fn test_scenario_e_second_call_served_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let geo = geocode_mock(&mut server, SAO_PAULO_GEOCODE, 1).await;
        let air = air_mock(&mut server, &report_body(r#"{"european_aqi": 15}"#), 1).await;

        let service = http_service(&server, EventBus::new());
        let first = service.get_air_quality_data(&sao_paulo()).await.unwrap();
        // Different spelling, same normalized key
        let again = LocationQuery::new("são paulo ", "sp", Some("BRASIL"));
        let second = service.get_air_quality_data(&again).await.unwrap();

        // Two HTTP calls in total, not four
        geo.assert_async().await;
        air.assert_async().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_calls() {
        let mock = Arc::new(MockClient::new());
        let service = mock_service(mock.clone(), EventBus::new());
        let query = LocationQuery::new("Denver", "CO", None::<String>);

        service.get_air_quality_data(&query).await.unwrap();
        let counts = mock.call_counts().await;
        assert_eq!(counts.total(), 2);

        for _ in 0..3 {
            service.get_air_quality_data(&query).await.unwrap();
        }
        assert_eq!(mock.call_counts().await.total(), 2);
        assert!(service.cached(&query).is_some());
    }

    #[tokio::test]
    async fn test_blank_and_default_country_share_cache_entry() {
        let mock = Arc::new(MockClient::new());
        let service = mock_service(mock.clone(), EventBus::new());

        let blank = LocationQuery {
            city: "Denver".to_string(),
            state: "CO".to_string(),
            country: String::new(),
        };
        service.get_air_quality_data(&blank).await.unwrap();
        service
            .get_air_quality_data(&LocationQuery::new("Denver", "CO", Some("US")))
            .await
            .unwrap();

        assert_eq!(mock.call_counts().await.geocode, 1);
    }

    #[tokio::test]
    async fn test_retry_ceiling_then_exhausted() {
        let mock = Arc::new(
            MockClient::new()
                .with_geocode_error(LookupError::GeocodingUnavailable(ServiceFailure::Status(503))),
        );
        let service = mock_service(mock.clone(), EventBus::new());

        let err = service
            .get_air_quality_data(&sao_paulo())
            .await
            .unwrap_err();

        let counts = mock.call_counts().await;
        assert_eq!(counts.geocode, 3);
        assert_eq!(counts.air_quality, 0);
        match err {
            LookupError::RetryExhausted {
                operation, attempts, ..
            } => {
                assert_eq!(operation, Operation::Geocoding);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_location_not_found_after_one_attempt() {
        let mock = Arc::new(MockClient::new().with_geocode_error(LookupError::LocationNotFound {
            query: "Nowhere".to_string(),
        }));
        let service = mock_service(mock.clone(), EventBus::new());

        let err = service
            .get_air_quality_data(&LocationQuery::new("Nowhere", "", None::<String>))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LocationNotFound);
        assert_eq!(mock.call_counts().await.geocode, 1);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let mock = Arc::new(MockClient::new().with_air_quality_failures(vec![
            LookupError::AirQualityUnavailable(ServiceFailure::Status(502)),
        ]));
        let service = mock_service(mock.clone(), EventBus::new());

        assert!(service.get_air_quality_data(&sao_paulo()).await.is_ok());
        assert_eq!(mock.call_counts().await.air_quality, 2);
    }

    #[tokio::test]
    async fn test_event_sequence_on_success_then_hit() {
        let bus = EventBus::new();
        let events = record_events(&bus);
        let service = mock_service(Arc::new(MockClient::new()), bus);
        let query = LocationQuery::new("Denver", "CO", None::<String>);

        service.get_air_quality_data(&query).await.unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "loading-start",
                "data-cached",
                "data-retrieved",
                "success",
                "loading-end"
            ]
        );

        events.lock().unwrap().clear();
        service.get_air_quality_data(&query).await.unwrap();
        assert_eq!(*events.lock().unwrap(), vec!["data-retrieved", "loading-end"]);
    }

    #[tokio::test]
    async fn test_error_event_carries_context() {
        let bus = EventBus::new();
        let captured: Arc<Mutex<Option<Arc<ErrorInfo>>>> = Arc::new(Mutex::new(None));
        let sink = captured.clone();
        bus.subscribe(
            EventKind::Error,
            move |event| {
                if let Event::Error(info) = event {
                    *sink.lock().unwrap() = Some(info.clone());
                }
                Ok(())
            },
            SubscribeOptions::default(),
        );
        let events = record_events(&bus);

        let mock = Arc::new(MockClient::new().with_geocode_error(LookupError::LocationNotFound {
            query: "Atlantis".to_string(),
        }));
        let service = mock_service(mock, bus);
        let query = LocationQuery::new("Atlantis", "", Some("Greece"));
        let _ = service.get_air_quality_data(&query).await;

        let info = captured.lock().unwrap().clone().unwrap();
        assert_eq!(info.kind(), ErrorKind::LocationNotFound);
        assert_eq!(info.operation, Some(Operation::Geocoding));
        assert_eq!(info.query, query);
        assert_eq!(info.key, "atlantis||greece");

        let names = events.lock().unwrap().clone();
        assert_eq!(names, vec!["loading-start", "error", "loading-end"]);
    }

    #[tokio::test]
    async fn test_loading_end_once_when_future_dropped() {
        let bus = EventBus::new();
        let events = record_events(&bus);
        let mock = Arc::new(
            MockClient::new()
                .with_geocode_error(LookupError::GeocodingUnavailable(ServiceFailure::Status(503))),
        );
        let service = AirQualityService::new(
            mock.clone(),
            mock,
            Arc::new(ResultCache::in_memory(10, Duration::from_secs(600))),
            bus,
        )
        .with_retry_policy(RetryPolicy::new(3, Duration::from_secs(60)));

        let query = sao_paulo();
        let lookup = service.get_air_quality_data(&query);
        // Cancel while the first retry backoff is sleeping
        let _ = tokio::time::timeout(Duration::from_millis(50), lookup).await;

        let names = events.lock().unwrap().clone();
        assert_eq!(names, vec!["loading-start", "loading-end"]);
    }

    #[tokio::test]
    async fn test_overall_timeout() {
        let mock = Arc::new(
            MockClient::new()
                .with_geocode_error(LookupError::GeocodingUnavailable(ServiceFailure::Status(503))),
        );
        let service = mock_service(mock, EventBus::new())
            .with_retry_policy(RetryPolicy::new(3, Duration::from_secs(60)))
            .with_timeout(Some(Duration::from_millis(30)));

        let err = service
            .get_air_quality_data(&sao_paulo())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_bind_routes_submit_events() {
        let bus = EventBus::new();
        let events = record_events(&bus);
        let mock = Arc::new(MockClient::new());
        let service = Arc::new(mock_service(mock.clone(), bus.clone()));
        let _subscription = service.bind(&bus);

        bus.publish_async(Event::Submit(LocationQuery::new("Denver", "CO", None::<String>)))
            .await;

        assert_eq!(mock.call_counts().await.total(), 2);
        assert!(events.lock().unwrap().contains(&"success"));
    }

    #[tokio::test]
    async fn test_bind_lapses_when_service_dropped() {
        let bus = EventBus::new();
        let mock = Arc::new(MockClient::new());
        let service = Arc::new(mock_service(mock.clone(), bus.clone()));
        let _subscription = service.bind(&bus);
        drop(service);

        bus.publish_async(Event::Submit(LocationQuery::new("Denver", "CO", None::<String>)))
            .await;

        assert_eq!(mock.call_counts().await.total(), 0);
    }
}
