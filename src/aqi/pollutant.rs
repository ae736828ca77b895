//! Pollutant readings, safety limits and the dominant pollutant

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::models::AirQualityReport;

/// Pollutants requested from the air quality service.
///
/// Variant order is alphabetical by key and defines iteration order of
/// pollutant maps, which in turn decides dominant-pollutant ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Co,
    No2,
    O3,
    Pm10,
    #[serde(rename = "pm2_5")]
    Pm25,
    So2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Co,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::Pm10,
        Pollutant::Pm25,
        Pollutant::So2,
    ];

    /// Field name in the air quality service's `current` section
    pub fn api_field(&self) -> &'static str {
        match self {
            Pollutant::Co => "carbon_monoxide",
            Pollutant::No2 => "nitrogen_dioxide",
            Pollutant::O3 => "ozone",
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm25 => "pm2_5",
            Pollutant::So2 => "sulphur_dioxide",
        }
    }

    /// 24-hour guideline concentration in μg/m³ (WHO 2021)
    pub fn safety_limit(&self) -> f64 {
        match self {
            Pollutant::Co => 4000.0,
            Pollutant::No2 => 25.0,
            Pollutant::O3 => 100.0,
            Pollutant::Pm10 => 45.0,
            Pollutant::Pm25 => 15.0,
            Pollutant::So2 => 40.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pollutant::Co => "Carbon monoxide (CO)",
            Pollutant::No2 => "Nitrogen dioxide (NO₂)",
            Pollutant::O3 => "Ozone (O₃)",
            Pollutant::Pm10 => "Particulate matter (PM10)",
            Pollutant::Pm25 => "Fine particulate matter (PM2.5)",
            Pollutant::So2 => "Sulphur dioxide (SO₂)",
        }
    }

    /// Concentration as a fraction of the safety limit
    pub fn limit_ratio(&self, value: f64) -> f64 {
        value / self.safety_limit()
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Concentration level relative to the safety limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollutantLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl PollutantLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio <= 0.5 {
            PollutantLevel::Low
        } else if ratio <= 1.0 {
            PollutantLevel::Moderate
        } else if ratio <= 2.0 {
            PollutantLevel::High
        } else {
            PollutantLevel::VeryHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PollutantLevel::Low => "low",
            PollutantLevel::Moderate => "moderate",
            PollutantLevel::High => "high",
            PollutantLevel::VeryHigh => "very high",
        }
    }
}

/// A single pollutant measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    pub value: f64,
    pub unit: String,
    pub level: PollutantLevel,
}

impl PollutantReading {
    pub fn new(pollutant: Pollutant, value: f64, unit: impl Into<String>) -> Self {
        Self {
            pollutant,
            value,
            unit: unit.into(),
            level: PollutantLevel::from_ratio(pollutant.limit_ratio(value)),
        }
    }
}

/// Readings for every pollutant the report actually contains.
pub fn readings(report: &AirQualityReport) -> BTreeMap<Pollutant, PollutantReading> {
    Pollutant::ALL
        .into_iter()
        .filter_map(|pollutant| {
            let field = pollutant.api_field();
            let value = report.value(field)?;
            let unit = report.unit(field).unwrap_or("μg/m³");
            Some((pollutant, PollutantReading::new(pollutant, value, unit)))
        })
        .collect()
}

/// Pollutant with the highest fraction of its safety limit.
///
/// Ties go to the first pollutant in map order.
pub fn dominant_pollutant(
    readings: &BTreeMap<Pollutant, PollutantReading>,
) -> Option<&PollutantReading> {
    let mut dominant: Option<(&PollutantReading, f64)> = None;
    for reading in readings.values() {
        let ratio = reading.pollutant.limit_ratio(reading.value);
        match dominant {
            Some((_, best)) if ratio <= best => {}
            _ => dominant = Some((reading, ratio)),
        }
    }
    dominant.map(|(reading, _)| reading)
}
