//! Common display utilities and helpers

use colored::{ColoredString, Colorize};

/// Format a reading without trailing noise: `15`, `5.2`, `0.35`
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else if value.abs() >= 1.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Colour text by severity rank (1 best, 6 worst, 0 unknown)
pub fn paint_severity(text: &str, severity: u8) -> ColoredString {
    match severity {
        1 => text.green(),
        2 => text.bright_green(),
        3 => text.yellow(),
        4 => text.bright_red(),
        5 => text.red(),
        6 => text.magenta(),
        _ => text.dimmed(),
    }
}

/// Truncate string to max length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
