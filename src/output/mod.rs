//! Output formatting for CLI results

pub mod json;
pub mod progress;
pub mod table;

pub use progress::LoadingIndicator;
