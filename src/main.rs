//! aircheck - current air quality for a city, from the terminal

use clap::{CommandFactory, Parser};

mod aqi;
mod cache;
mod cli;
mod client;
mod config;
mod error;
mod events;
mod models;
mod output;
mod pipeline;

use cli::{CacheCommands, Cli, Commands, ConfigCommands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Log to stderr; `--debug` raises the default filter, `RUST_LOG` still wins.
fn init_logging(debug: bool) {
    let default_filter = if debug { "aircheck=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    log::debug!("Debug mode enabled");

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Check(args) => cli::check::run(&opts, args).await,
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(opts.format),
            CacheCommands::Clear => cli::cache::clear(opts.format),
            CacheCommands::Path => cli::cache::path(),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => cli::config::show(&opts),
            ConfigCommands::Path => cli::config::path(&opts),
            ConfigCommands::Init { yes, force } => cli::config::init(&opts, yes, force),
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "aircheck", &mut std::io::stdout());
            Ok(())
        }
        Commands::Version => {
            println!("aircheck version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
