//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod cache;
pub mod check;
pub mod config;
pub mod context;
pub mod form;

pub use args::{GlobalOptions, LocationArgs, OutputFormat};
pub use context::CommandContext;

/// aircheck - current air quality for a city, from the terminal
#[derive(Parser, Debug)]
#[command(name = "aircheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "AIRCHECK_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "AIRCHECK_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "AIRCHECK_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Bypass the result cache and always query the services
    #[arg(long, global = true, env = "AIRCHECK_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Geocoding endpoint (Nominatim-compatible search URL)
    #[arg(long, global = true, env = "AIRCHECK_GEOCODING_URL", hide = true)]
    pub geocoding_url: Option<String>,

    /// Air quality endpoint (Open-Meteo-compatible URL)
    #[arg(long, global = true, env = "AIRCHECK_AIR_QUALITY_URL", hide = true)]
    pub air_quality_url: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up current air quality for a location
    #[command(after_help = "EXAMPLES:\n  \
        aircheck check --city Denver --state CO\n  \
        aircheck check --city \"São Paulo\" --state SP --country Brasil\n  \
        aircheck check --city Paris --state \"Ile-de-France\" --country France --format json\n  \
        aircheck check                       # prompts for the location")]
    Check(LocationArgs),

    /// Manage the local result cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Show or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(after_help = "\
  bash:   aircheck completion bash > /etc/bash_completion.d/aircheck
  zsh:    aircheck completion zsh > \"${fpath[1]}/_aircheck\"
  fish:   aircheck completion fish > ~/.config/fish/completions/aircheck.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Display version information
    Version,
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Remove all cached results
    Clear,

    /// Print the cache directory
    Path,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a configuration file, prompting for values when interactive
    Init {
        /// Write defaults without prompting
        #[arg(long, short = 'y')]
        yes: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::try_parse_from([
            "aircheck", "check", "--city", "Denver", "--state", "CO", "--format", "table",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Table);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.city.as_deref(), Some("Denver"));
                assert_eq!(args.state.as_deref(), Some("CO"));
                assert_eq!(args.country, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_subcommands() {
        let cli = Cli::try_parse_from(["aircheck", "cache", "clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Cache(CacheCommands::Clear)));

        let cli = Cli::try_parse_from(["aircheck", "config", "init", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Init {
                yes: true,
                force: false
            })
        ));

        let cli = Cli::try_parse_from(["aircheck", "completion", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completion { shell: Shell::Zsh }
        ));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["aircheck", "--format", "xml", "version"]).is_err());
    }
}
