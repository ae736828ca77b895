//! Loading spinner for lookups in flight

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner driven by `loading-start` / `loading-end` events.
///
/// When not visible (JSON output, no terminal) the state is still tracked
/// but nothing is drawn.
pub struct LoadingIndicator {
    bar: Mutex<Option<ProgressBar>>,
    visible: bool,
}

impl LoadingIndicator {
    pub fn new(visible: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            visible,
        }
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_spinner(&self, message: &str) -> ProgressBar {
        let pb = if self.visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        };
        let style = ProgressStyle::default_spinner()
            .tick_strings(TICKS)
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        if self.visible {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        pb
    }

    /// Show the spinner; a running spinner only gets its message replaced.
    pub fn start(&self, message: &str) {
        let mut bar = self.bar();
        match bar.as_ref() {
            Some(pb) => pb.set_message(message.to_string()),
            None => *bar = Some(self.new_spinner(message)),
        }
    }

    /// Hide the spinner. Safe to call when nothing is showing.
    pub fn stop(&self) {
        if let Some(pb) = self.bar().take() {
            pb.finish_and_clear();
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.bar().is_some()
    }
}

impl Drop for LoadingIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}
