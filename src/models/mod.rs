//! Display models for CLI output

pub mod display;

pub use display::{AirQualityDisplay, AirQualityReportJson, LookupErrorDisplay, PrettyAirQuality};
