//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - coloured sections for reading in a terminal (default)
    #[default]
    Pretty,
    /// Table format - one summary row plus a pollutant table
    Table,
    /// JSON format - structured for scripts
    Json,
}

impl OutputFormat {
    /// Whether spinners and prompts belong in this format
    pub fn is_interactive(&self) -> bool {
        !matches!(self, OutputFormat::Json)
    }
}
