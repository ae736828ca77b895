//! `aircheck check` - look up air quality for one location
//!
//! The form, the spinner and the result view only talk to the lookup
//! service through the event bus.

use std::io::IsTerminal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::aqi::AirQualityResult;
use crate::cache::ResultCache;
use crate::cli::form::LocationForm;
use crate::cli::{CommandContext, GlobalOptions, LocationArgs, OutputFormat};
use crate::error::{Error, Result};
use crate::events::{
    DataSource, ErrorInfo, Event, EventBus, EventKind, SubscribeOptions, Subscription,
};
use crate::models::display::{can_retry, hint};
use crate::models::{AirQualityDisplay, AirQualityReportJson, LookupErrorDisplay, PrettyAirQuality};
use crate::output::LoadingIndicator;
use crate::output::json::print_json;
use crate::output::table::format_table;

/// How the last lookup ended, as seen by the view
#[derive(Debug, Clone)]
pub enum Outcome {
    Shown(DataSource),
    Failed(Arc<ErrorInfo>),
}

/// Renders `success` / `error` events in the chosen output format.
pub struct ResultView {
    format: OutputFormat,
    outcome: Mutex<Option<Outcome>>,
}

impl ResultView {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            outcome: Mutex::new(None),
        }
    }

    fn outcome_slot(&self) -> MutexGuard<'_, Option<Outcome>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the outcome of the lookup that just finished.
    pub fn take_outcome(&self) -> Option<Outcome> {
        self.outcome_slot().take()
    }

    pub fn show_result(&self, result: &AirQualityResult, source: DataSource) -> anyhow::Result<()> {
        print!("{}", render_result(self.format, result, source)?);
        *self.outcome_slot() = Some(Outcome::Shown(source));
        Ok(())
    }

    pub fn show_error(&self, info: &Arc<ErrorInfo>) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => print_json(&LookupErrorDisplay::from(info.as_ref()))?,
            OutputFormat::Pretty | OutputFormat::Table => {
                eprintln!("{}", hint(&info.error).dimmed());
            }
        }
        *self.outcome_slot() = Some(Outcome::Failed(info.clone()));
        Ok(())
    }

    /// Subscribe to result events. Cache hits carry no `success` event, so
    /// `data-retrieved(cache)` is rendered from the entry the lookup just
    /// read, leaving its access stats alone.
    pub fn attach(
        self: &Arc<Self>,
        bus: &EventBus,
        cache: Arc<ResultCache<AirQualityResult>>,
    ) -> Vec<Subscription> {
        let on_success = {
            let view = self.clone();
            bus.subscribe(
                EventKind::Success,
                move |event| match event {
                    Event::Success(result) => view.show_result(result, DataSource::Api),
                    _ => Ok(()),
                },
                SubscribeOptions::default(),
            )
        };

        let on_error = {
            let view = self.clone();
            bus.subscribe(
                EventKind::Error,
                move |event| match event {
                    Event::Error(info) => view.show_error(info),
                    _ => Ok(()),
                },
                SubscribeOptions::default(),
            )
        };

        let on_cache_hit = {
            let view = self.clone();
            bus.subscribe(
                EventKind::DataRetrieved,
                move |event| match event {
                    Event::DataRetrieved {
                        key,
                        source: DataSource::Cache,
                    } => match cache.entry(key) {
                        Some(entry) => view.show_result(&entry.value, DataSource::Cache),
                        None => Err(anyhow::anyhow!("cached result for {} vanished", key)),
                    },
                    _ => Ok(()),
                },
                SubscribeOptions::default(),
            )
        };

        vec![on_success, on_error, on_cache_hit]
    }
}

/// Render a result for `format`. Text formats end with a newline.
pub fn render_result(
    format: OutputFormat,
    result: &AirQualityResult,
    source: DataSource,
) -> std::result::Result<String, serde_json::Error> {
    let output = match format {
        OutputFormat::Pretty => {
            let pretty = PrettyAirQuality::new(result).with_source(Some(source));
            let pollutants = format_table(&pretty.pollutant_rows(), "No pollutant readings reported.");
            format!("{}\n{}\n", pretty.format_text(), pollutants)
        }
        OutputFormat::Table => {
            let summary = format_table(&[AirQualityDisplay::from(result)], "");
            let pollutants = format_table(
                &PrettyAirQuality::new(result).pollutant_rows(),
                "No pollutant readings reported.",
            );
            format!("{}\n{}\n", summary, pollutants)
        }
        OutputFormat::Json => {
            crate::output::json::format_json(&AirQualityReportJson {
                result,
                source: Some(source),
            })? + "\n"
        }
    };
    Ok(output)
}

/// Drive the spinner from `loading-start` / `loading-end`.
fn attach_spinner(bus: &EventBus, indicator: Arc<LoadingIndicator>) -> Vec<Subscription> {
    let start = {
        let indicator = indicator.clone();
        bus.subscribe(
            EventKind::LoadingStart,
            move |event| {
                if let Event::LoadingStart { query } = event {
                    indicator.start(&format!("Checking air quality for {}...", query));
                }
                Ok(())
            },
            SubscribeOptions::default(),
        )
    };
    let end = bus.subscribe(
        EventKind::LoadingEnd,
        move |_| {
            indicator.stop();
            Ok(())
        },
        SubscribeOptions::default(),
    );
    vec![start, end]
}

fn confirm_retry() -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Try again?")
        .default(true)
        .interact()?)
}

/// Run the check command
pub async fn run(opts: &GlobalOptions, args: LocationArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let form = LocationForm::new(args, ctx.config.default_country.clone());
    let interactive = form.is_interactive() && ctx.format.is_interactive();

    let indicator = Arc::new(LoadingIndicator::new(
        ctx.format.is_interactive() && std::io::stderr().is_terminal(),
    ));
    let view = Arc::new(ResultView::new(ctx.format));

    let mut subscriptions = attach_spinner(&ctx.bus, indicator);
    subscriptions.extend(view.attach(&ctx.bus, ctx.service.cache().clone()));
    subscriptions.push(ctx.service.bind(&ctx.bus));

    let query = form.submit(&ctx.bus).await?;
    let outcome = loop {
        let outcome = view.take_outcome();
        if let Some(Outcome::Failed(ref info)) = outcome
            && interactive
            && can_retry(&info.error)
            && confirm_retry()?
        {
            ctx.bus.publish_async(Event::Submit(query.clone())).await;
            continue;
        }
        break outcome;
    };

    for subscription in subscriptions {
        subscription.unsubscribe();
    }

    match outcome {
        Some(Outcome::Shown(source)) => {
            log::debug!("Result for {} shown from {:?}", query, source);
            Ok(())
        }
        Some(Outcome::Failed(info)) => Err(Error::Lookup(info.error.clone())),
        None => Err(Error::Other(format!("No result for {}", query))),
    }
}
