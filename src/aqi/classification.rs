//! AQI classification tables

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index scale an AQI value is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AqiScale {
    European,
    Us,
}

impl fmt::Display for AqiScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AqiScale::European => f.write_str("European AQI"),
            AqiScale::Us => f.write_str("US AQI"),
        }
    }
}

/// Health-risk category of an AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    ExtremelyPoor,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

/// Inclusive upper bounds; anything above the last bound gets the fallback.
const EUROPEAN_THRESHOLDS: [(f64, Classification); 5] = [
    (20.0, Classification::Good),
    (40.0, Classification::Fair),
    (60.0, Classification::Moderate),
    (80.0, Classification::Poor),
    (100.0, Classification::VeryPoor),
];

const US_THRESHOLDS: [(f64, Classification); 5] = [
    (50.0, Classification::Good),
    (100.0, Classification::Moderate),
    (150.0, Classification::UnhealthyForSensitive),
    (200.0, Classification::Unhealthy),
    (300.0, Classification::VeryUnhealthy),
];

/// Category bounds for `scale` and the category above the last bound
fn scale_table(scale: AqiScale) -> (&'static [(f64, Classification); 5], Classification) {
    match scale {
        AqiScale::European => (&EUROPEAN_THRESHOLDS, Classification::ExtremelyPoor),
        AqiScale::Us => (&US_THRESHOLDS, Classification::Hazardous),
    }
}

/// Classify an AQI value on the given scale.
pub fn classify(value: Option<f64>, scale: AqiScale) -> Classification {
    let Some(value) = value else {
        return Classification::Unknown;
    };

    let (thresholds, above) = scale_table(scale);

    thresholds
        .iter()
        .find(|(bound, _)| value <= *bound)
        .map(|(_, class)| *class)
        .unwrap_or(above)
}

impl Classification {
    /// Position within `scale`, 1 (best) to 6 (worst); 0 when unknown or
    /// not a category of `scale`.
    pub fn severity(&self, scale: AqiScale) -> u8 {
        let (thresholds, above) = scale_table(scale);

        thresholds
            .iter()
            .map(|(_, class)| *class)
            .chain(std::iter::once(above))
            .position(|class| class == *self)
            .map_or(0, |rank| rank as u8 + 1)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Good => "Good",
            Classification::Fair => "Fair",
            Classification::Moderate => "Moderate",
            Classification::Poor => "Poor",
            Classification::VeryPoor => "Very Poor",
            Classification::ExtremelyPoor => "Extremely Poor",
            Classification::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            Classification::Unhealthy => "Unhealthy",
            Classification::VeryUnhealthy => "Very Unhealthy",
            Classification::Hazardous => "Hazardous",
            Classification::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
