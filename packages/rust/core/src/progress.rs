//! Semantic run events for whoever is watching the run.
//!
//! The core never formats or prints these itself; the CLI renders them, and
//! tests either ignore them ([`SilentProgress`]) or record them.

use leafdex_crawler::{ProgressSnapshot, SectionFailure};
use leafdex_shared::{Item, ItemLink, LeafdexError, RunResult};

/// Progress callback for reporting run status.
pub trait ProgressSink: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the catalog is built. `attempting` is after the processing cap.
    fn catalog_ready(&self, found: usize, attempting: usize);
    /// Called when an item is admitted by the scheduler.
    fn item_started(&self, link: &ItemLink);
    /// Called when an item completes (possibly with degraded sections).
    fn item_succeeded(&self, item: &Item);
    /// Called when an item is dropped from the result.
    fn item_failed(&self, name: &str, error: &LeafdexError);
    /// Called for each section that degraded to empty.
    fn section_failed(&self, item: &str, failure: &SectionFailure);
    /// Called exactly once per attempted item, success or not.
    fn progress(&self, snapshot: ProgressSnapshot);
    /// Called after the result has been written.
    fn done(&self, result: &RunResult);
}

/// No-op progress sink for headless/test usage.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn catalog_ready(&self, _found: usize, _attempting: usize) {}
    fn item_started(&self, _link: &ItemLink) {}
    fn item_succeeded(&self, _item: &Item) {}
    fn item_failed(&self, _name: &str, _error: &LeafdexError) {}
    fn section_failed(&self, _item: &str, _failure: &SectionFailure) {}
    fn progress(&self, _snapshot: ProgressSnapshot) {}
    fn done(&self, _result: &RunResult) {}
}
