//! Cache key normalization

use crate::client::models::LocationQuery;

/// Separator between location parts in a cache key
pub const KEY_DELIMITER: char = '|';

fn normalize_part(part: &str) -> String {
    part.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Build the cache key for a location query.
///
/// The default country is substituted before the key is built, so a blank
/// country and an explicit default produce the same key.
pub fn normalize_key(query: &LocationQuery, default_country: &str) -> String {
    let country = if query.country.trim().is_empty() {
        default_country
    } else {
        query.country.as_str()
    };

    [
        normalize_part(&query.city),
        normalize_part(&query.state),
        normalize_part(country),
    ]
    .join(&KEY_DELIMITER.to_string())
}
