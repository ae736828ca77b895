//! Client-side request throttling
//!
//! Public geocoding services ask callers to stay under a fixed request rate
//! (Nominatim: 1 request per second). The throttle is proactive: every
//! request waits for a permit.

use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;

/// Request throttle for a single upstream service.
pub struct RequestThrottle {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    rate: f64,
}

impl RequestThrottle {
    /// Build a throttle allowing `rate` requests per second.
    ///
    /// Returns `None` for a zero, negative or non-finite rate, which means
    /// "do not throttle".
    pub fn per_second(rate: f64) -> Option<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }

        // Handle sub-1 rates by using per-minute quotas
        let quota = if rate >= 1.0 {
            Quota::per_second(NonZeroU32::new(rate as u32).unwrap_or(NonZeroU32::MIN))
        } else {
            let per_min = (rate * 60.0).round() as u32;
            Quota::per_minute(NonZeroU32::new(per_min).unwrap_or(NonZeroU32::MIN))
        };

        Some(Self {
            limiter: RateLimiter::direct(quota),
            rate,
        })
    }

    /// Configured rate in requests per second
    #[cfg(test)]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Wait until the next request may be sent.
    pub async fn wait(&self) {
        if self.limiter.check().is_err() {
            debug!("Throttling request ({} req/s)", self.rate);
            self.limiter.until_ready().await;
        }
    }
}
