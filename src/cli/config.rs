//! Configuration commands

use std::io::IsTerminal;

use colored::Colorize;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::cli::context::effective_config;
use crate::cli::form::validate_field;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::output::json::print_json;

/// Print the effective configuration (file values plus overrides)
pub fn show(opts: &GlobalOptions) -> Result<()> {
    let config = effective_config(opts)?;

    match opts.format {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Pretty | OutputFormat::Table => {
            let yaml = serde_yaml::to_string(&config)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Print the config file path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    println!("{}", Config::resolve_path(opts.config_ref())?.display());
    Ok(())
}

/// Write a config file. Prompts for the common settings unless `yes` is
/// set or stdin is not a terminal.
pub fn init(opts: &GlobalOptions, yes: bool, force: bool) -> Result<()> {
    let path = Config::resolve_path(opts.config_ref())?;
    if path.exists() && !force {
        return Err(ConfigError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }

    let config = if yes || !std::io::stdin().is_terminal() {
        Config::default()
    } else {
        prompt_config()?
    };
    config.validate()?;
    config.save_to(&path)?;

    println!(
        "{} Configuration saved to: {}",
        "✓".green(),
        path.display()
    );
    println!("\n{}", "Try running:".bold());
    println!(
        "  {} - Check air quality",
        "aircheck check --city Denver --state CO".cyan()
    );
    Ok(())
}

fn prompt_config() -> Result<Config> {
    let theme = ColorfulTheme::default();
    let mut config = Config::default();

    println!("{}", "Welcome to aircheck!".bold().green());
    println!("Press enter to keep the default shown in brackets.\n");

    config.default_country = Input::<String>::with_theme(&theme)
        .with_prompt("Default country")
        .default(config.default_country.clone())
        .validate_with(|value: &String| {
            validate_field("Country", value, true).map_err(|e| e.to_string())
        })
        .interact_text()?;

    config.cache.ttl_secs = Input::<u64>::with_theme(&theme)
        .with_prompt("Keep results for (seconds)")
        .default(config.cache.ttl_secs)
        .interact_text()?;

    config.cache.persistent = Confirm::with_theme(&theme)
        .with_prompt("Keep results between runs?")
        .default(config.cache.persistent)
        .interact()?;

    let timeout = Input::<u64>::with_theme(&theme)
        .with_prompt("Give up on a lookup after (seconds, 0 for never)")
        .default(0)
        .interact_text()?;
    config.request_timeout_secs = (timeout > 0).then_some(timeout);

    Ok(config)
}
