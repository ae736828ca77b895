//! Location models

use serde::{Deserialize, Serialize};

/// Country assumed when the user leaves it blank
pub const DEFAULT_COUNTRY: &str = "US";

/// A location as entered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery {
    /// City name
    pub city: String,

    /// State, province or region (may be empty)
    #[serde(default)]
    pub state: String,

    /// Country name or code
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl LocationQuery {
    /// Create a query, substituting [`DEFAULT_COUNTRY`] for a missing country.
    pub fn new(
        city: impl Into<String>,
        state: impl Into<String>,
        country: Option<impl Into<String>>,
    ) -> Self {
        let country = country.map(Into::into).unwrap_or_else(default_country);
        Self {
            city: city.into(),
            state: state.into(),
            country,
        }
        .with_default_country(DEFAULT_COUNTRY)
    }

    /// Replace a blank country with `default`.
    pub fn with_default_country(mut self, default: &str) -> Self {
        if self.country.trim().is_empty() {
            self.country = default.to_string();
        }
        self
    }

    /// Free-text search string for the geocoder.
    ///
    /// Non-empty parts are joined with ", "; the country is left out when it
    /// is the default one.
    pub fn search_string(&self, default_country: &str) -> String {
        let country = self.country.trim();
        let country = if country.is_empty() || country.eq_ignore_ascii_case(default_country) {
            ""
        } else {
            country
        };

        [self.city.trim(), self.state.trim(), country]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<&str> = [self.city.trim(), self.state.trim(), self.country.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Geographic bounding box of a geocoded place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

/// Resolved coordinates for a location query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,

    /// Full place name as reported by the geocoder
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Raw address details from the geocoder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<serde_json::Value>,
}
