//! Terminal rendering of run progress.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use leafdex_core::{ProgressSink, ProgressSnapshot, SectionFailure};
use leafdex_shared::{Item, ItemLink, LeafdexError, RunResult};
use tracing::{debug, warn};

const BAR_TEMPLATE: &str =
    "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// CLI progress sink: spinner during discovery, then a bar over the items.
pub(crate) struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressSink for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn catalog_ready(&self, found: usize, attempting: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.bar.set_length(attempting as u64);
        self.bar.set_position(0);
        if attempting < found {
            self.bar
                .println(format!("  {found} items found, processing the first {attempting}"));
        } else {
            self.bar.println(format!("  {found} items found"));
        }
    }

    fn item_started(&self, link: &ItemLink) {
        debug!(item = link.label(), url = %link.url, "item started");
    }

    fn item_succeeded(&self, item: &Item) {
        debug!(item = %item.name, "item done");
    }

    fn item_failed(&self, name: &str, error: &LeafdexError) {
        warn!(item = name, url = error.url().unwrap_or("-"), error = %error, "item failed");
    }

    fn section_failed(&self, item: &str, failure: &SectionFailure) {
        warn!(
            item,
            section = %failure.key,
            url = failure.error.url().unwrap_or("-"),
            error = %failure.error,
            "section left empty"
        );
    }

    fn progress(&self, snapshot: ProgressSnapshot) {
        self.bar.set_position(snapshot.processed as u64);
        let eta = snapshot
            .eta
            .map(|eta| format!("ETA {}s", eta.as_secs()))
            .unwrap_or_default();
        self.bar.set_message(eta);
    }

    fn done(&self, _result: &RunResult) {
        self.bar.finish_and_clear();
    }
}
