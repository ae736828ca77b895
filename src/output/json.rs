//! JSON output formatting
//!
//! Every JSON document printed by the CLI is `{ "data": ..., "meta": ... }`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Envelope for JSON output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

/// When and by which version the document was produced
#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub version: String,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Format data as pretty-printed JSON inside the envelope
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

/// Print data as enveloped JSON to stdout
pub fn print_json<T: Serialize + ?Sized>(data: &T) -> Result<(), serde_json::Error> {
    println!("{}", format_json(data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Clone)]
    struct Reading {
        pollutant: String,
        value: f64,
    }

    #[test]
    fn test_json_output_carries_metadata() {
        let output = JsonOutput::new(vec!["pm10", "ozone"]);

        assert_eq!(output.data, vec!["pm10", "ozone"]);
        assert_eq!(output.meta.version, env!("CARGO_PKG_VERSION"));
        assert!(chrono::DateTime::parse_from_rfc3339(&output.meta.timestamp).is_ok());
    }

    #[test]
    fn test_format_json_wraps_data() {
        let reading = Reading {
            pollutant: "pm2_5".to_string(),
            value: 5.2,
        };

        let result = format_json(&reading).unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(value["data"]["pollutant"], "pm2_5");
        assert_eq!(value["data"]["value"], 5.2);
        assert!(value["meta"]["timestamp"].is_string());
        assert!(value["meta"]["version"].is_string());
    }

    #[test]
    fn test_format_json_empty_vec() {
        let readings: Vec<Reading> = vec![];
        let result = format_json(&readings).unwrap();

        assert!(result.contains("\"data\": []"));
    }
}
