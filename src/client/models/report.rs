//! Air quality service models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current conditions returned by the air quality service.
///
/// `current` maps requested field names (`european_aqi`, `pm2_5`, ...) to
/// raw JSON values; fields the service could not provide are `null` or
/// missing altogether.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReport {
    #[serde(default)]
    pub current: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub current_units: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl AirQualityReport {
    /// Numeric value of a `current` field, if present and finite
    pub fn value(&self, field: &str) -> Option<f64> {
        self.current
            .get(field)
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// Unit string for a `current` field
    pub fn unit(&self, field: &str) -> Option<&str> {
        self.current_units.get(field).map(String::as_str)
    }

    /// Observation time reported by the service (local to `timezone`)
    pub fn observed_at(&self) -> Option<&str> {
        self.current.get("time").and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> AirQualityReport {
        serde_json::from_str(
            r#"{
                "latitude": -23.55,
                "longitude": -46.63,
                "elevation": 760.0,
                "timezone": "America/Sao_Paulo",
                "current": {"time": "2025-01-15T10:00", "european_aqi": 15, "pm10": null},
                "current_units": {"european_aqi": "EAQI", "pm10": "μg/m³"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_value_reads_integers_as_floats() {
        assert_eq!(report().value("european_aqi"), Some(15.0));
    }

    #[test]
    fn test_value_null_and_missing() {
        let r = report();
        assert_eq!(r.value("pm10"), None);
        assert_eq!(r.value("ozone"), None);
    }

    #[test]
    fn test_unit_and_time() {
        let r = report();
        assert_eq!(r.unit("pm10"), Some("μg/m³"));
        assert_eq!(r.observed_at(), Some("2025-01-15T10:00"));
    }
}
