//! Command execution context
//!
//! Loads configuration, merges the CLI/env overrides into it and wires up
//! the clients, the result cache and the lookup service for `check`.

use std::sync::Arc;

use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::aqi::AirQualityResult;
use crate::cache::{CacheStorage, ResultCache, SystemClock, layered};
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{NominatimClient, OpenMeteoClient};
use crate::config::Config;
use crate::error::Result;
use crate::events::EventBus;
use crate::pipeline::AirQualityService;

/// Everything a lookup command needs, built once per invocation.
pub struct CommandContext {
    /// Effective configuration (file values with CLI/env overrides applied)
    pub config: Config,
    /// Bus shared by the form, the service and the renderers
    pub bus: EventBus,
    pub service: Arc<AirQualityService>,
    /// Output format preference
    pub format: OutputFormat,
    sweeper: Option<JoinHandle<()>>,
}

impl CommandContext {
    /// Build the context for `opts`.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be parsed or is invalid,
    /// or if an HTTP client cannot be constructed.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = effective_config(opts)?;
        let bus = EventBus::new();

        let geocoder = NominatimClient::new(config.geocoding.base_url.clone())?
            .with_user_agent(config.geocoding.user_agent())
            .with_default_country(config.default_country.clone())
            .with_rate_limit(config.geocoding.requests_per_second);
        let air_quality = OpenMeteoClient::new(config.air_quality.base_url.clone())?;

        let cache = Arc::new(build_cache(&config, opts.no_cache));
        let sweeper = match config.sweep_interval() {
            Some(every) if cache.is_enabled() => Some(cache.spawn_sweeper(every)),
            _ => None,
        };

        let service = AirQualityService::new(
            Arc::new(geocoder),
            Arc::new(air_quality),
            cache,
            bus.clone(),
        )
        .with_retry_policy(config.retry_policy())
        .with_ttl(config.cache_ttl())
        .with_timeout(config.request_timeout())
        .with_default_country(config.default_country.clone());

        Ok(Self {
            config,
            bus,
            service: Arc::new(service),
            format: opts.format,
            sweeper,
        })
    }
}

impl Drop for CommandContext {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

/// Load the config file and apply the endpoint overrides from flags/env.
pub fn effective_config(opts: &GlobalOptions) -> Result<Config> {
    let mut config = Config::load_at(opts.config_ref())?;

    if let Some(ref url) = opts.geocoding_url {
        config.geocoding.base_url = url.clone();
    }
    if let Some(ref url) = opts.air_quality_url {
        config.air_quality.base_url = url.clone();
    }
    if opts.no_cache {
        config.cache.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

/// Result cache per the `cache` settings. An unusable durable tier only
/// costs persistence, never the lookup.
fn build_cache(config: &Config, no_cache: bool) -> ResultCache<AirQualityResult> {
    let settings = &config.cache;
    let enabled = settings.enabled && !no_cache;

    let durable = if enabled && settings.persistent {
        match CacheStorage::open() {
            Ok(storage) => {
                debug!("Durable cache at {}", storage.db_path().display());
                Some(storage)
            }
            Err(e) => {
                warn!("Durable cache unavailable, using memory only: {}", e);
                None
            }
        }
    } else {
        None
    };

    layered::build(
        settings.capacity,
        config.cache_ttl(),
        Arc::new(SystemClock),
        durable,
    )
    .with_enabled(enabled)
}
