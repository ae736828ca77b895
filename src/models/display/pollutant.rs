//! Pollutant display model

use serde::Serialize;
use tabled::Tabled;

use super::common::format_value;
use crate::aqi::PollutantReading;

/// One pollutant reading as a table row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct PollutantRow {
    #[tabled(rename = "POLLUTANT")]
    pub pollutant: String,

    #[tabled(rename = "VALUE")]
    pub value: String,

    #[tabled(rename = "UNIT")]
    pub unit: String,

    /// Percent of the safety limit
    #[tabled(rename = "% OF LIMIT")]
    pub limit_percent: String,

    #[tabled(rename = "LEVEL")]
    pub level: String,
}

impl From<&PollutantReading> for PollutantRow {
    fn from(reading: &PollutantReading) -> Self {
        let ratio = reading.pollutant.limit_ratio(reading.value);
        Self {
            pollutant: reading.pollutant.name().to_string(),
            value: format_value(reading.value),
            unit: reading.unit.clone(),
            limit_percent: format!("{:.0}%", ratio * 100.0),
            level: reading.level.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::Pollutant;

    #[test]
    fn test_row_from_reading() {
        let reading = PollutantReading::new(Pollutant::Pm25, 22.5, "μg/m³");
        let row = PollutantRow::from(&reading);

        assert_eq!(row.pollutant, "Fine particulate matter (PM2.5)");
        assert_eq!(row.value, "22.5");
        assert_eq!(row.limit_percent, "150%");
        assert_eq!(row.level, "high");
    }
}
