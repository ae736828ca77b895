//! Display model implementations for table, pretty and JSON output
//!
//! Display models turn lookup results and failures into CLI-friendly
//! formats with column names and serialization.

mod air_quality;
mod common;
mod error;
mod pollutant;

pub use air_quality::{AirQualityDisplay, AirQualityReportJson, PrettyAirQuality};
pub use error::{LookupErrorDisplay, can_retry, hint};
pub use pollutant::PollutantRow;
