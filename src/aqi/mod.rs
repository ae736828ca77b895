//! Air quality analysis
//!
//! Turns a raw report from the air quality service into a classified
//! result: primary AQI value, health-risk category, dominant pollutant and
//! health recommendation. Everything here is pure and deterministic.

pub mod advice;
pub mod classification;
pub mod pollutant;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::models::{AirQualityReport, Coordinates, LocationQuery};

pub use advice::{HealthRecommendation, recommendation};
pub use classification::{AqiScale, Classification, classify};
pub use pollutant::{Pollutant, PollutantReading, dominant_pollutant};

/// Classified air quality for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityResult {
    /// Primary AQI value (European when available, else US)
    pub aqi_value: Option<f64>,
    pub aqi_scale: AqiScale,
    pub classification: Classification,
    pub dominant_pollutant: Option<PollutantReading>,
    pub pollutants: BTreeMap<Pollutant, PollutantReading>,
    pub health_recommendation: HealthRecommendation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub european_aqi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub us_aqi: Option<f64>,

    /// Observation time reported by the service, local to `timezone`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,

    /// When the result was produced
    pub timestamp: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub location: LocationQuery,
}

/// Primary AQI value and the scale it is on.
///
/// European wins over US; with neither present the value is `None` and the
/// scale stays European.
pub fn primary_aqi(report: &AirQualityReport) -> (Option<f64>, AqiScale) {
    match (report.value("european_aqi"), report.value("us_aqi")) {
        (Some(eu), _) => (Some(eu), AqiScale::European),
        (None, Some(us)) => (Some(us), AqiScale::Us),
        (None, None) => (None, AqiScale::European),
    }
}

/// Derive a full result from a raw report.
pub fn assess(
    report: &AirQualityReport,
    coordinates: Coordinates,
    location: LocationQuery,
    timestamp: DateTime<Utc>,
) -> AirQualityResult {
    let (aqi_value, aqi_scale) = primary_aqi(report);
    let classification = classify(aqi_value, aqi_scale);
    let pollutants = pollutant::readings(report);
    let dominant = dominant_pollutant(&pollutants).cloned();

    AirQualityResult {
        aqi_value,
        aqi_scale,
        classification,
        dominant_pollutant: dominant,
        pollutants,
        health_recommendation: recommendation(classification),
        european_aqi: report.value("european_aqi"),
        us_aqi: report.value("us_aqi"),
        observed_at: report.observed_at().map(str::to_string),
        timezone: report.timezone.clone(),
        elevation: report.elevation,
        timestamp,
        coordinates,
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinates() -> Coordinates {
        Coordinates {
            latitude: -23.5505,
            longitude: -46.6333,
            display_name: "São Paulo, Brasil".to_string(),
            bounding_box: None,
            address: None,
        }
    }

    fn report(json: &str) -> AirQualityReport {
        serde_json::from_str(json).unwrap()
    }

    fn query() -> LocationQuery {
        LocationQuery::new("São Paulo", "SP", Some("Brasil"))
    }

    #[test]
    fn test_prefers_european_scale() {
        let r = report(r#"{"current": {"european_aqi": 30, "us_aqi": 120}}"#);
        assert_eq!(primary_aqi(&r), (Some(30.0), AqiScale::European));
    }

    #[test]
    fn test_falls_back_to_us_scale() {
        let r = report(r#"{"current": {"european_aqi": null, "us_aqi": 120}}"#);
        assert_eq!(primary_aqi(&r), (Some(120.0), AqiScale::Us));

        let result = assess(&r, coordinates(), query(), Utc::now());
        assert_eq!(result.classification, Classification::UnhealthyForSensitive);
    }

    #[test]
    fn test_no_index_is_unknown_with_good_advice() {
        let r = report(r#"{"current": {"pm10": 20.0}}"#);
        let result = assess(&r, coordinates(), query(), Utc::now());

        assert_eq!(result.aqi_value, None);
        assert_eq!(result.classification, Classification::Unknown);
        assert_eq!(
            result.health_recommendation,
            recommendation(Classification::Good)
        );
    }

    #[test]
    fn test_assess_good_air() {
        let r = report(
            r#"{
                "timezone": "America/Sao_Paulo",
                "elevation": 760.0,
                "current": {"time": "2025-01-15T10:00", "european_aqi": 15, "pm2_5": 4.0, "ozone": 60.0}
            }"#,
        );
        let result = assess(&r, coordinates(), query(), Utc::now());

        assert_eq!(result.classification, Classification::Good);
        assert_eq!(result.pollutants.len(), 2);
        assert_eq!(
            result.dominant_pollutant.as_ref().map(|d| d.pollutant),
            Some(Pollutant::O3)
        );
        assert_eq!(result.observed_at.as_deref(), Some("2025-01-15T10:00"));
        assert_eq!(result.timezone.as_deref(), Some("America/Sao_Paulo"));
    }

    #[test]
    fn test_result_json_round_trip() {
        let r = report(r#"{"current": {"european_aqi": 65, "pm2_5": 40.0, "nitrogen_dioxide": 12.0}}"#);
        let result = assess(&r, coordinates(), query(), Utc::now());

        let json = serde_json::to_string(&result).unwrap();
        let back: AirQualityResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
