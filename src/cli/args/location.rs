//! Location form flags

use clap::Args;

/// Location to look up. Missing fields are prompted for when stdin is a
/// terminal.
#[derive(Debug, Clone, Default, Args)]
pub struct LocationArgs {
    /// City name
    #[arg(long)]
    pub city: Option<String>,

    /// State, province or region
    #[arg(long)]
    pub state: Option<String>,

    /// Country (defaults to the configured default country)
    #[arg(long)]
    pub country: Option<String>,
}
