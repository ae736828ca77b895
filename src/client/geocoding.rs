//! Nominatim geocoding client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::GeocodingApi;
use super::models::{BoundingBox, Coordinates, DEFAULT_COUNTRY, LocationQuery};
use super::rate_limit::RequestThrottle;
use crate::error::{LookupError, ServiceFailure};

/// Public Nominatim search endpoint
pub const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim usage policy: at most one request per second
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 1.0;

/// Identifying User-Agent sent with every request
pub fn default_user_agent() -> String {
    format!(
        "aircheck/{} (+{})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY")
    )
}

/// One search candidate as returned by the service
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    boundingbox: Option<Vec<String>>,
    #[serde(default)]
    address: Option<serde_json::Value>,
}

impl Place {
    fn into_coordinates(self) -> Result<Coordinates, LookupError> {
        let latitude = parse_degrees("lat", &self.lat)?;
        let longitude = parse_degrees("lon", &self.lon)?;
        Ok(Coordinates {
            latitude,
            longitude,
            display_name: self.display_name,
            bounding_box: self.boundingbox.as_deref().and_then(parse_bounding_box),
            address: self.address,
        })
    }
}

fn parse_degrees(field: &str, raw: &str) -> Result<f64, LookupError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            LookupError::GeocodingUnavailable(ServiceFailure::InvalidResponse(format!(
                "`{}` is not a number: {:?}",
                field, raw
            )))
        })
}

/// `[south, north, west, east]` as strings; anything else is dropped.
fn parse_bounding_box(raw: &[String]) -> Option<BoundingBox> {
    let values: Vec<f64> = raw
        .iter()
        .map(|v| v.trim().parse::<f64>().ok())
        .collect::<Option<_>>()?;
    match values.as_slice() {
        [south, north, west, east] => Some(BoundingBox {
            south: *south,
            north: *north,
            west: *west,
            east: *east,
        }),
        _ => None,
    }
}

/// Geocoding client for a Nominatim-compatible search API
pub struct NominatimClient {
    http: HttpClient,
    base_url: String,
    user_agent: String,
    default_country: String,
    throttle: Option<RequestThrottle>,
}

impl NominatimClient {
    /// Create a client against `base_url`, throttled to the public rate.
    pub fn new(base_url: impl Into<String>) -> Result<Self, LookupError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LookupError::GeocodingUnavailable(e.into()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            user_agent: default_user_agent(),
            default_country: DEFAULT_COUNTRY.to_string(),
            throttle: RequestThrottle::per_second(DEFAULT_REQUESTS_PER_SECOND),
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = country.into();
        self
    }

    /// Requests per second; 0 disables throttling.
    pub fn with_rate_limit(mut self, requests_per_second: f64) -> Self {
        self.throttle = RequestThrottle::per_second(requests_per_second);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl GeocodingApi for NominatimClient {
    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinates, LookupError> {
        let search = query.search_string(&self.default_country);

        if let Some(ref throttle) = self.throttle {
            throttle.wait().await;
        }

        log::debug!("Geocoding {:?} via {}", search, self.base_url);
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", search.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| LookupError::GeocodingUnavailable(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("Geocoding returned {}", status);
            return Err(LookupError::GeocodingUnavailable(ServiceFailure::Status(
                status.as_u16(),
            )));
        }

        let places = response.json::<Vec<Place>>().await.map_err(|e| {
            LookupError::GeocodingUnavailable(ServiceFailure::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        match places.into_iter().next() {
            Some(place) => place.into_coordinates(),
            None => Err(LookupError::LocationNotFound { query: search }),
        }
    }
}
