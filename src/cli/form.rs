//! Location form
//!
//! Collects a location from flags, prompting for the rest when stdin is a
//! terminal, validates it locally and publishes it as a `submit` event.
//! Invalid input never reaches the bus.

use std::io::IsTerminal;

use dialoguer::{Input, theme::ColorfulTheme};

use crate::cli::LocationArgs;
use crate::client::models::LocationQuery;
use crate::error::{LookupError, Result};
use crate::events::{Event, EventBus};

const MIN_LEN: usize = 2;
const MAX_LEN: usize = 100;

/// Check one form field. `required` fields may not be blank.
pub fn validate_field(label: &str, value: &str, required: bool) -> std::result::Result<(), LookupError> {
    let value = value.trim();
    if value.is_empty() {
        return if required {
            Err(LookupError::Validation(format!("{} is required", label)))
        } else {
            Ok(())
        };
    }

    let len = value.chars().count();
    if len < MIN_LEN {
        return Err(LookupError::Validation(format!(
            "{} must be at least {} characters",
            label, MIN_LEN
        )));
    }
    if len > MAX_LEN {
        return Err(LookupError::Validation(format!(
            "{} must be at most {} characters",
            label, MAX_LEN
        )));
    }
    if let Some(bad) = value.chars().find(|c| !is_allowed(*c)) {
        return Err(LookupError::Validation(format!(
            "{} contains an invalid character: '{}'",
            label, bad
        )));
    }
    Ok(())
}

fn is_allowed(c: char) -> bool {
    c.is_alphabetic() || c == ' ' || matches!(c, '-' | '\'' | '.' | ',')
}

/// Validate all fields and build the query. Blank state is allowed; a
/// blank country becomes `default_country`.
pub fn validate_query(
    city: &str,
    state: &str,
    country: &str,
    default_country: &str,
) -> std::result::Result<LocationQuery, LookupError> {
    validate_field("City", city, true)?;
    validate_field("State", state, false)?;
    validate_field("Country", country, false)?;

    let country = match country.trim() {
        "" => default_country,
        country => country,
    };
    Ok(LocationQuery::new(city.trim(), state.trim(), Some(country)))
}

/// The form: flag values plus prompts for whatever is missing.
pub struct LocationForm {
    args: LocationArgs,
    interactive: bool,
    default_country: String,
}

impl LocationForm {
    pub fn new(args: LocationArgs, default_country: impl Into<String>) -> Self {
        Self {
            args,
            interactive: std::io::stdin().is_terminal(),
            default_country: default_country.into(),
        }
    }

    /// Never prompt, even on a terminal.
    #[cfg(test)]
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Gather and validate the location.
    ///
    /// Prompts only run when the city was not given on the command line;
    /// when it was, blank state or country are taken as intended.
    pub fn collect(&self) -> Result<LocationQuery> {
        let prompt = self.interactive && self.args.city.is_none();

        let city = match (&self.args.city, prompt) {
            (Some(city), _) => city.clone(),
            (None, true) => self.ask("City", true, None)?,
            (None, false) => String::new(),
        };
        let state = match (&self.args.state, prompt) {
            (Some(state), _) => state.clone(),
            (None, true) => self.ask("State / region", false, None)?,
            (None, false) => String::new(),
        };
        let country = match (&self.args.country, prompt) {
            (Some(country), _) => country.clone(),
            (None, true) => self.ask("Country", false, Some(self.default_country.clone()))?,
            (None, false) => String::new(),
        };

        Ok(validate_query(
            &city,
            &state,
            &country,
            &self.default_country,
        )?)
    }

    fn ask(&self, label: &str, required: bool, default: Option<String>) -> Result<String> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(label)
            .allow_empty(!required);
        if let Some(default) = default {
            input = input.default(default);
        }
        let owned = label.to_string();
        let value = input
            .validate_with(move |value: &String| {
                validate_field(&owned, value, required).map_err(|e| e.to_string())
            })
            .interact_text()?;
        Ok(value)
    }

    /// Collect the location and hand it to whoever listens for `submit`.
    pub async fn submit(&self, bus: &EventBus) -> Result<LocationQuery> {
        let query = self.collect()?;
        bus.publish_async(Event::Submit(query.clone())).await;
        Ok(query)
    }
}
