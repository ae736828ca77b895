//! Upstream service data models
//!
//! Types exchanged with the geocoding and air quality services, plus the
//! user's location query that starts every lookup.

mod location;
mod report;

pub use location::{BoundingBox, Coordinates, DEFAULT_COUNTRY, LocationQuery};
pub use report::AirQualityReport;
