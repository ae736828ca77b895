//! Cache management commands
//!
//! These act on the durable tier only; the memory tier lives for a single
//! run.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::cache::CacheStorage;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output::json::print_json;

#[derive(Debug, Serialize)]
struct CacheStatusJson {
    total_entries: usize,
    valid_entries: usize,
    expired_entries: usize,
    total_size_bytes: usize,
    total_size_human: String,
    oldest_entry: Option<DateTime<Utc>>,
    newest_entry: Option<DateTime<Utc>>,
    path: String,
}

#[derive(Debug, Serialize)]
struct CacheClearJson {
    entries_removed: usize,
    success: bool,
}

fn cache_path_display() -> String {
    CacheStorage::cache_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Show cache status/statistics
pub fn status(format: OutputFormat) -> Result<()> {
    let cache = CacheStorage::open()?;
    let stats = cache.stats(Utc::now())?;

    match format {
        OutputFormat::Json => print_json(&CacheStatusJson {
            total_entries: stats.total_entries,
            valid_entries: stats.valid_entries,
            expired_entries: stats.expired_entries,
            total_size_bytes: stats.total_size_bytes,
            total_size_human: format_size(stats.total_size_bytes),
            oldest_entry: stats.oldest_entry,
            newest_entry: stats.newest_entry,
            path: cache_path_display(),
        })?,
        OutputFormat::Pretty | OutputFormat::Table => {
            println!("Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", cache_path_display());
            println!("Valid entries:  {}", stats.valid_entries);
            println!("Expired:        {}", stats.expired_entries);
            println!("Total size:     {}", format_size(stats.total_size_bytes));

            if let Some(oldest) = stats.oldest_entry {
                println!("Oldest entry:   {}", local_time(oldest));
            }
            if let Some(newest) = stats.newest_entry {
                println!("Newest entry:   {}", local_time(newest));
            }
        }
    }

    Ok(())
}

/// Clear all cache entries
pub fn clear(format: OutputFormat) -> Result<()> {
    let cache = CacheStorage::open()?;
    let stats = cache.clear_all()?;

    match format {
        OutputFormat::Json => print_json(&CacheClearJson {
            entries_removed: stats.entries_removed,
            success: true,
        })?,
        OutputFormat::Pretty | OutputFormat::Table => {
            if stats.entries_removed > 0 {
                println!("Cleared {} cached results", stats.entries_removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path() -> Result<()> {
    println!("{}", CacheStorage::cache_dir()?.display());
    Ok(())
}

/// Format bytes as human-readable size
fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
