//! Open-Meteo air quality client

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::AirQualityApi;
use super::models::{AirQualityReport, Coordinates};
use crate::error::{LookupError, ServiceFailure};

/// Public Open-Meteo air quality endpoint
pub const DEFAULT_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Fields requested in the `current` section
pub const CURRENT_FIELDS: [&str; 8] = [
    "european_aqi",
    "us_aqi",
    "pm10",
    "pm2_5",
    "carbon_monoxide",
    "nitrogen_dioxide",
    "sulphur_dioxide",
    "ozone",
];

/// Response shape before the `current` section is checked
#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    current: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    current_units: BTreeMap<String, String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    elevation: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
}

impl RawReport {
    fn into_report(self) -> Result<AirQualityReport, LookupError> {
        let current = self
            .current
            .ok_or(LookupError::AirQualityUnavailable(ServiceFailure::MissingData))?;
        Ok(AirQualityReport {
            current,
            current_units: self.current_units,
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.elevation,
            timezone: self.timezone,
        })
    }
}

/// Air quality client for an Open-Meteo-compatible API
pub struct OpenMeteoClient {
    http: HttpClient,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LookupError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LookupError::AirQualityUnavailable(e.into()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AirQualityApi for OpenMeteoClient {
    async fn air_quality(&self, coordinates: &Coordinates) -> Result<AirQualityReport, LookupError> {
        log::debug!(
            "Fetching air quality for ({}, {}) via {}",
            coordinates.latitude,
            coordinates.longitude,
            self.base_url
        );

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current", CURRENT_FIELDS.join(",")),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| LookupError::AirQualityUnavailable(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("Air quality service returned {}", status);
            return Err(LookupError::AirQualityUnavailable(ServiceFailure::Status(
                status.as_u16(),
            )));
        }

        let raw = response.json::<RawReport>().await.map_err(|e| {
            LookupError::AirQualityUnavailable(ServiceFailure::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        raw.into_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const GOOD_REPORT: &str = r#"{
        "latitude": -23.55,
        "longitude": -46.63,
        "elevation": 760.0,
        "timezone": "America/Sao_Paulo",
        "current_units": {"european_aqi": "EAQI", "pm2_5": "μg/m³", "ozone": "μg/m³"},
        "current": {
            "time": "2024-05-01T12:00",
            "european_aqi": 18,
            "us_aqi": 30,
            "pm10": 9.1,
            "pm2_5": 5.2,
            "carbon_monoxide": 210.0,
            "nitrogen_dioxide": 12.4,
            "sulphur_dioxide": 3.1,
            "ozone": 48.0
        }
    }"#;

    fn coordinates() -> Coordinates {
        Coordinates {
            latitude: -23.5506507,
            longitude: -46.6333824,
            display_name: "São Paulo".to_string(),
            bounding_box: None,
            address: None,
        }
    }

    fn client(server: &mockito::Server) -> OpenMeteoClient {
        OpenMeteoClient::new(format!("{}/v1/air-quality", server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_report() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/air-quality")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("latitude".into(), "-23.5506507".into()),
                Matcher::UrlEncoded("longitude".into(), "-46.6333824".into()),
                Matcher::UrlEncoded("current".into(), CURRENT_FIELDS.join(",")),
                Matcher::UrlEncoded("timezone".into(), "auto".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(GOOD_REPORT)
            .expect(1)
            .create_async()
            .await;

        let report = client(&server).air_quality(&coordinates()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(report.value("european_aqi"), Some(18.0));
        assert_eq!(report.value("pm2_5"), Some(5.2));
        assert_eq!(report.unit("pm2_5"), Some("μg/m³"));
        assert_eq!(report.timezone.as_deref(), Some("America/Sao_Paulo"));
        assert_eq!(report.observed_at(), Some("2024-05-01T12:00"));
    }

    #[tokio::test]
    async fn test_non_200_success_status_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/air-quality")
            .match_query(Matcher::Any)
            .with_status(203)
            .with_body(GOOD_REPORT)
            .create_async()
            .await;

        let report = client(&server).air_quality(&coordinates()).await.unwrap();

        assert_eq!(report.value("european_aqi"), Some(18.0));
    }

    #[tokio::test]
    async fn test_missing_current_section() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/air-quality")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"latitude": 1.0, "longitude": 2.0}"#)
            .create_async()
            .await;

        let err = client(&server).air_quality(&coordinates()).await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::AirQualityUnavailable(ServiceFailure::MissingData)
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_http_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/air-quality")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = client(&server).air_quality(&coordinates()).await.unwrap_err();
        assert!(matches!(
            err,
            LookupError::AirQualityUnavailable(ServiceFailure::Status(429))
        ));
    }

    #[tokio::test]
    async fn test_null_values_are_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/air-quality")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"current": {"european_aqi": null, "pm10": 20.0}}"#)
            .create_async()
            .await;

        let report = client(&server).air_quality(&coordinates()).await.unwrap();
        assert_eq!(report.value("european_aqi"), None);
        assert_eq!(report.value("pm10"), Some(20.0));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport() {
        let client = OpenMeteoClient::new("http://127.0.0.1:9/v1/air-quality").unwrap();
        let err = client.air_quality(&coordinates()).await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::AirQualityUnavailable(ServiceFailure::Transport(_))
        ));
    }
}
