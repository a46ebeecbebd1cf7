//! Spinner shown while a replication runs

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use wsp_core::{CopyFailure, CopyTask, ReplicationObserver};

/// Draws copy progress on stderr; counts are updated as copies settle
pub struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{pos} copied, {elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message("Listing...");
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for SpinnerObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationObserver for SpinnerObserver {
    fn on_page(&self, page: usize, objects: usize) {
        self.bar
            .set_message(format!("Copying page {page} ({objects} objects)"));
    }

    fn on_copied(&self, _task: &CopyTask) {
        self.bar.inc(1);
    }

    fn on_failed(&self, failure: &CopyFailure) {
        self.bar
            .println(format!("✗ {}: {}", failure.task.source_key, failure.error));
    }
}
