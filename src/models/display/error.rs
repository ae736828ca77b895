//! Lookup failure display model

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::models::LocationQuery;
use crate::error::{ErrorKind, LookupError, Operation};
use crate::events::ErrorInfo;

/// A failed lookup as shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct LookupErrorDisplay {
    pub message: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    pub query: LocationQuery,
    pub retryable: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&ErrorInfo> for LookupErrorDisplay {
    fn from(info: &ErrorInfo) -> Self {
        Self {
            message: info.error.to_string(),
            kind: info.kind(),
            operation: info.operation,
            query: info.query.clone(),
            retryable: can_retry(&info.error),
            timestamp: info.timestamp,
        }
    }
}

/// Whether offering the user another try makes sense
pub fn can_retry(error: &LookupError) -> bool {
    matches!(
        error.root(),
        LookupError::GeocodingUnavailable(_)
            | LookupError::AirQualityUnavailable(_)
            | LookupError::Timeout { .. }
    )
}

/// Actionable hint for the failure kind
pub fn hint(error: &LookupError) -> &'static str {
    match error.root() {
        LookupError::LocationNotFound { .. } => {
            "Check the spelling, or add a state or country to narrow the search."
        }
        LookupError::Validation(_) => "Correct the highlighted field and try again.",
        LookupError::GeocodingUnavailable(_) => {
            "The geocoding service could not be reached. Try again in a moment."
        }
        LookupError::AirQualityUnavailable(_) => {
            "The air quality service could not be reached. Try again in a moment."
        }
        LookupError::Timeout { .. } => "The lookup took too long. Try again in a moment.",
        LookupError::RetryExhausted { .. } => "Try again in a moment.",
    }
}
