//! Application events
//!
//! The form, the lookup pipeline and the renderers never hold references to
//! each other; they communicate only through an [`EventBus`] carrying these
//! events.

pub mod bus;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aqi::AirQualityResult;
use crate::client::models::LocationQuery;
use crate::error::{ErrorKind, LookupError, Operation};

pub use bus::{EventBus, SubscribeOptions, Subscription};

/// Event discriminant used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Submit,
    LoadingStart,
    LoadingEnd,
    Success,
    Error,
    DataCached,
    DataRetrieved,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Submit => "submit",
            EventKind::LoadingStart => "loading-start",
            EventKind::LoadingEnd => "loading-end",
            EventKind::Success => "success",
            EventKind::Error => "error",
            EventKind::DataCached => "data-cached",
            EventKind::DataRetrieved => "data-retrieved",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Api,
}

/// Context published alongside a failed lookup
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub error: LookupError,
    pub operation: Option<Operation>,
    pub query: LocationQuery,
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorInfo {
    pub fn new(error: LookupError, query: LocationQuery, key: String) -> Self {
        Self {
            operation: error.operation(),
            error,
            query,
            key,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Everything that can travel over the bus
#[derive(Debug, Clone)]
pub enum Event {
    /// Validated form input
    Submit(LocationQuery),
    LoadingStart { query: LocationQuery },
    LoadingEnd { query: LocationQuery },
    Success(Arc<AirQualityResult>),
    Error(Arc<ErrorInfo>),
    DataCached { key: String },
    DataRetrieved { key: String, source: DataSource },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Submit(_) => EventKind::Submit,
            Event::LoadingStart { .. } => EventKind::LoadingStart,
            Event::LoadingEnd { .. } => EventKind::LoadingEnd,
            Event::Success(_) => EventKind::Success,
            Event::Error(_) => EventKind::Error,
            Event::DataCached { .. } => EventKind::DataCached,
            Event::DataRetrieved { .. } => EventKind::DataRetrieved,
        }
    }
}
