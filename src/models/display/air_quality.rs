//! Air quality result display models

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use super::common::{format_value, paint_severity, truncate_string};
use super::pollutant::PollutantRow;
use crate::aqi::AirQualityResult;
use crate::events::DataSource;

/// One-line summary of a result for table output
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct AirQualityDisplay {
    #[tabled(rename = "LOCATION")]
    pub location: String,

    #[tabled(rename = "AQI")]
    pub aqi: String,

    #[tabled(rename = "SCALE")]
    pub scale: String,

    #[tabled(rename = "CATEGORY")]
    pub category: String,

    #[tabled(rename = "DOMINANT")]
    pub dominant: String,

    #[tabled(rename = "OBSERVED")]
    pub observed: String,
}

impl From<&AirQualityResult> for AirQualityDisplay {
    fn from(result: &AirQualityResult) -> Self {
        Self {
            location: truncate_string(&result.location.to_string(), 40),
            aqi: result
                .aqi_value
                .map(format_value)
                .unwrap_or_else(|| "--".to_string()),
            scale: result.aqi_scale.to_string(),
            category: result.classification.label().to_string(),
            dominant: result
                .dominant_pollutant
                .as_ref()
                .map(|r| r.pollutant.name().to_string())
                .unwrap_or_else(|| "--".to_string()),
            observed: result.observed_at.clone().unwrap_or_else(|| "--".to_string()),
        }
    }
}

/// JSON payload for a result, tagged with where it came from
#[derive(Debug, Clone, Serialize)]
pub struct AirQualityReportJson<'a> {
    #[serde(flatten)]
    pub result: &'a AirQualityResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
}

/// Multi-section text rendering of a result
#[derive(Debug, Clone)]
pub struct PrettyAirQuality<'a> {
    pub result: &'a AirQualityResult,
    pub source: Option<DataSource>,
}

impl<'a> PrettyAirQuality<'a> {
    pub fn new(result: &'a AirQualityResult) -> Self {
        Self {
            result,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<DataSource>) -> Self {
        self.source = source;
        self
    }

    pub fn pollutant_rows(&self) -> Vec<PollutantRow> {
        self.result.pollutants.values().map(PollutantRow::from).collect()
    }

    /// Format header, AQI and recommendation sections (the pollutant table
    /// is rendered separately).
    pub fn format_text(&self) -> String {
        let result = self.result;
        let severity = result.classification.severity(result.aqi_scale);
        let mut output = String::new();

        output.push_str(&format!("{}\n", result.location.to_string().bold()));
        if !result.coordinates.display_name.is_empty() {
            output.push_str(&format!(
                "{}\n",
                truncate_string(&result.coordinates.display_name, 80).dimmed()
            ));
        }
        output.push_str("════════════════════════════════════════════════════════════════════\n");

        let aqi = result
            .aqi_value
            .map(format_value)
            .unwrap_or_else(|| "--".to_string());
        output.push_str(&format!(
            "Air quality:  {} ({} {})\n",
            paint_severity(result.classification.label(), severity).bold(),
            result.aqi_scale,
            aqi
        ));

        if let Some(ref dominant) = result.dominant_pollutant {
            output.push_str(&format!(
                "Dominant:     {} at {} {} ({})\n",
                dominant.pollutant.name(),
                format_value(dominant.value),
                dominant.unit,
                dominant.level.label()
            ));
        }

        output.push_str(&format!(
            "Coordinates:  {:.4}, {:.4}\n",
            result.coordinates.latitude, result.coordinates.longitude
        ));

        if let Some(ref observed) = result.observed_at {
            match result.timezone {
                Some(ref tz) => output.push_str(&format!("Observed:     {} ({})\n", observed, tz)),
                None => output.push_str(&format!("Observed:     {}\n", observed)),
            }
        }

        match self.source {
            Some(DataSource::Cache) => output.push_str(&format!(
                "Source:       {}\n",
                format!("cache (fetched {})", result.timestamp.format("%Y-%m-%d %H:%M UTC")).dimmed()
            )),
            Some(DataSource::Api) => output.push_str("Source:       live\n"),
            None => {}
        }

        let advice = &result.health_recommendation;
        output.push_str("\n─── Health recommendations ────────────────────────────────────────\n");
        output.push_str(&format!("General:      {}\n", advice.general));
        output.push_str(&format!("Sensitive:    {}\n", advice.sensitive_groups));
        output.push_str(&format!("Activities:   {}\n", advice.activities));
        output.push_str(&format!("Indoors:      {}\n", advice.indoor));

        output
    }
}
