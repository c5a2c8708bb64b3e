//! Collects finished items and failures from concurrently completing tasks.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use leafdex_shared::{Item, RunResult};

#[derive(Debug, Default)]
struct Collected {
    items: Vec<Item>,
    failed_names: Vec<String>,
}

/// Shared sink for per-item outcomes.
///
/// Items are kept in completion order, which is unrelated to catalog order.
#[derive(Debug)]
pub struct ResultAggregator {
    total_found: usize,
    collected: Mutex<Collected>,
}

impl ResultAggregator {
    pub fn new(total_found: usize) -> Self {
        Self {
            total_found,
            collected: Mutex::new(Collected::default()),
        }
    }

    pub fn record_success(&self, item: Item) {
        self.lock().items.push(item);
    }

    pub fn record_failure(&self, name: impl Into<String>) {
        self.lock().failed_names.push(name.into());
    }

    /// Outcomes recorded so far.
    pub fn attempted(&self) -> usize {
        let collected = self.lock();
        collected.items.len() + collected.failed_names.len()
    }

    /// Assemble the result document, stamping the completion time.
    ///
    /// Drains the collected outcomes; a second call yields an empty result.
    pub fn finish(&self) -> RunResult {
        let collected = std::mem::take(&mut *self.lock());
        RunResult {
            total_found: self.total_found,
            succeeded: collected.items.len(),
            failed_names: collected.failed_names,
            items: collected.items,
            completed_at: Utc::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.collected.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use url::Url;

    use super::*;

    fn item(name: &str) -> Item {
        let url = Url::parse(&format!("https://www.example.org/medicines/{name}/")).unwrap();
        Item::new(name, &url, Utc::now())
    }

    #[test]
    fn counts_follow_recorded_outcomes() {
        let agg = ResultAggregator::new(5);
        agg.record_success(item("aciclovir"));
        agg.record_failure("Baclofen");
        agg.record_success(item("aspirin"));
        assert_eq!(agg.attempted(), 3);

        let result = agg.finish();
        assert_eq!(result.total_found, 5);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed_names, vec!["Baclofen"]);
        assert_eq!(result.attempted(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_pushes_are_not_lost() {
        let agg = Arc::new(ResultAggregator::new(200));
        let mut handles = Vec::new();
        for i in 0..200 {
            let agg = Arc::clone(&agg);
            handles.push(tokio::spawn(async move {
                if i % 4 == 0 {
                    agg.record_failure(format!("item-{i}"));
                } else {
                    agg.record_success(item(&format!("item-{i}")));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let result = agg.finish();
        assert_eq!(result.succeeded, 150);
        assert_eq!(result.failed_names.len(), 50);
    }
}
