//! End-to-end run: index → catalog → bounded item extraction → result → writer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{error, info, instrument};

use leafdex_crawler::{DetailExtractor, DetailOptions, Scheduler};
use leafdex_discovery::{DiscoveryOptions, discover};
use leafdex_provider::DocumentProvider;
use leafdex_shared::{ItemLink, LeafdexError, Result, RunConfig, RunResult};
use leafdex_text::TextPipeline;

use crate::aggregator::ResultAggregator;
use crate::persist::ResultWriter;
use crate::progress::ProgressSink;

/// Run the full pipeline.
///
/// 1. Discovery: fetch the index page and build the catalog (fatal on failure)
/// 2. Teach the text pipeline the catalog names, then apply the processing cap
/// 3. Extract every item under the scheduler (failures isolated per item)
/// 4. Assemble the result and hand it to `writer`
#[instrument(skip_all, fields(index = %config.index_url, concurrency = config.concurrency))]
pub async fn run(
    config: &RunConfig,
    provider: Arc<dyn DocumentProvider>,
    text: TextPipeline,
    progress: Arc<dyn ProgressSink>,
    writer: &dyn ResultWriter,
) -> Result<RunResult> {
    config.validate()?;
    let start = Instant::now();

    // --- Phase 1: Discovery ---
    progress.phase("Discovering catalog");
    let catalog = discover(provider.as_ref(), &DiscoveryOptions::from(config)).await?;
    let total_found = catalog.len();
    let text = text.with_vocabulary(catalog.iter().filter_map(|link| link.name.as_deref()));
    let links = apply_limit(catalog, config.limit);
    progress.catalog_ready(total_found, links.len());
    info!(total_found, attempting = links.len(), "catalog ready");

    // --- Phase 2: Extraction ---
    progress.phase("Extracting items");
    let extractor = DetailExtractor::new(provider, text, DetailOptions::from(config));
    let result = extract_all(links, total_found, config, extractor, Arc::clone(&progress)).await;

    // --- Phase 3: Persist ---
    progress.phase("Writing results");
    writer.write(&result)?;

    info!(
        succeeded = result.succeeded,
        failed = result.failed_names.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run complete"
    );
    progress.done(&result);
    Ok(result)
}

/// Keep the first `limit` catalog entries.
fn apply_limit(mut links: Vec<ItemLink>, limit: Option<usize>) -> Vec<ItemLink> {
    if let Some(limit) = limit {
        links.truncate(limit);
    }
    links
}

/// Spawn one task per link and wait for all of them.
///
/// Each task records its own outcome before releasing its permit. A task
/// that panics is recorded as a failure here, by task id.
async fn extract_all(
    links: Vec<ItemLink>,
    total_found: usize,
    config: &RunConfig,
    extractor: DetailExtractor,
    progress: Arc<dyn ProgressSink>,
) -> RunResult {
    let aggregator = Arc::new(ResultAggregator::new(total_found));
    let scheduler = Scheduler::new(config.concurrency, config.delay, links.len());

    let mut tasks = JoinSet::new();
    let mut names = HashMap::new();

    for link in links {
        let label = link.label().to_string();
        let scheduler = scheduler.clone();
        let extractor = extractor.clone();
        let aggregator = Arc::clone(&aggregator);
        let progress = Arc::clone(&progress);

        let handle = tasks.spawn(async move {
            let work = async {
                progress.item_started(&link);
                match extractor.extract(&link).await {
                    Ok(outcome) => {
                        for failure in &outcome.section_failures {
                            progress.section_failed(&outcome.item.name, failure);
                        }
                        progress.item_succeeded(&outcome.item);
                        aggregator.record_success(outcome.item);
                    }
                    Err(e) => {
                        progress.item_failed(link.label(), &e);
                        aggregator.record_failure(link.label());
                    }
                }
            };
            scheduler.run(work, |_, snapshot| progress.progress(snapshot)).await;
        });
        names.insert(handle.id(), label);
    }

    while let Some(joined) = tasks.join_next_with_id().await {
        let Err(join_error) = joined else {
            continue;
        };
        let name = names
            .remove(&join_error.id())
            .unwrap_or_else(|| "<unknown>".to_string());
        error!(item = %name, error = %join_error, "item task aborted");

        let cause = LeafdexError::parse(format!("extraction task failed: {join_error}"));
        progress.item_failed(&name, &cause);
        aggregator.record_failure(name);
        progress.progress(scheduler.tracker().record());
    }

    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use url::Url;

    use leafdex_crawler::{ProgressSnapshot, SectionFailure};
    use leafdex_provider::StaticProvider;
    use leafdex_shared::Item;
    use leafdex_text::Dictionary;

    use super::*;
    use crate::progress::SilentProgress;

    const INDEX: &str = "https://www.example.org/medicines/";
    const ACICLOVIR: &str = "https://www.example.org/medicines/aciclovir/";
    const AMOXICILLIN: &str = "https://www.example.org/medicines/amoxicillin/";
    const BACLOFEN: &str = "https://www.example.org/medicines/baclofen/";

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn config(limit: Option<usize>) -> RunConfig {
        RunConfig {
            index_url: Url::parse(INDEX).unwrap(),
            catalog_path: "/medicines/".into(),
            related_path: "/conditions/".into(),
            consent_selectors: vec!["#cookiebanner".into()],
            concurrency: 2,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            limit,
            output: PathBuf::from("unused.json"),
            dictionary_path: PathBuf::from("/nonexistent"),
        }
    }

    fn site() -> StaticProvider {
        StaticProvider::new()
            .with_page(
                INDEX,
                r#"<html><body><main>
                     <a href="/medicines/aciclovir/">Aciclovir</a>
                     <a href="/medicines/amoxicillin/">Amoxicillin</a>
                     <a href="/medicines/baclofen/">Baclofen</a>
                   </main></body></html>"#,
            )
            .with_page(ACICLOVIR, fixture("aciclovir.html"))
            .with_page(
                &format!("{ACICLOVIR}about-aciclovir/"),
                fixture("aciclovir_about.html"),
            )
            .with_page(
                AMOXICILLIN,
                "<html><body><main><h1>Amoxicillin</h1>\
                 <p>Amoxicillin is an antibiotic. It's used to treat bacterial infections such as chest infections.</p>\
                 </main></body></html>",
            )
            .with_failure(BACLOFEN)
    }

    #[derive(Default)]
    struct MemoryWriter {
        written: Mutex<Option<RunResult>>,
    }

    impl ResultWriter for MemoryWriter {
        fn write(&self, result: &RunResult) -> Result<()> {
            *self.written.lock().unwrap() = Some(result.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Mutex<Vec<String>>,
        failed: Mutex<Vec<String>>,
        sections_failed: Mutex<usize>,
        snapshots: Mutex<Vec<ProgressSnapshot>>,
        done: Mutex<bool>,
    }

    impl ProgressSink for RecordingProgress {
        fn phase(&self, _name: &str) {}
        fn catalog_ready(&self, _found: usize, _attempting: usize) {}
        fn item_started(&self, link: &ItemLink) {
            self.started.lock().unwrap().push(link.label().to_string());
        }
        fn item_succeeded(&self, _item: &Item) {}
        fn item_failed(&self, name: &str, _error: &LeafdexError) {
            self.failed.lock().unwrap().push(name.to_string());
        }
        fn section_failed(&self, _item: &str, _failure: &SectionFailure) {
            *self.sections_failed.lock().unwrap() += 1;
        }
        fn progress(&self, snapshot: ProgressSnapshot) {
            self.snapshots.lock().unwrap().push(snapshot);
        }
        fn done(&self, _result: &RunResult) {
            *self.done.lock().unwrap() = true;
        }
    }

    #[tokio::test]
    async fn failed_item_is_isolated() {
        let provider: Arc<dyn DocumentProvider> = Arc::new(site());
        let progress = Arc::new(RecordingProgress::default());
        let writer = MemoryWriter::default();

        let result = run(
            &config(None),
            provider,
            TextPipeline::default(),
            progress.clone(),
            &writer,
        )
        .await
        .unwrap();

        assert_eq!(result.total_found, 3);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed_names, vec!["Baclofen"]);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.attempted(), 3);

        let mut names: Vec<_> = result.items.iter().map(|i| i.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Aciclovir", "Amoxicillin"]);

        // Aciclovir links seven sections; only "about" is served.
        let aciclovir = result.items.iter().find(|i| i.name == "Aciclovir").unwrap();
        assert!(!aciclovir.about.paragraphs.is_empty());
        assert_eq!(*progress.sections_failed.lock().unwrap(), 6);

        let snapshots = progress.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 3);
        let last = snapshots.iter().max_by_key(|s| s.processed).unwrap();
        assert_eq!(last.processed, 3);
        assert_eq!(last.percent, 100.0);
        assert!(snapshots.iter().all(|s| s.eta.is_some()));

        assert_eq!(*progress.failed.lock().unwrap(), vec!["Baclofen"]);
        assert_eq!(progress.started.lock().unwrap().len(), 3);
        assert!(*progress.done.lock().unwrap());

        let written = writer.written.lock().unwrap();
        assert_eq!(written.as_ref().unwrap().succeeded, 2);
    }

    #[tokio::test]
    async fn catalog_names_are_not_split_by_text_repair() {
        const METFORMIN: &str = "https://www.example.org/medicines/metformin/";
        let provider: Arc<dyn DocumentProvider> = Arc::new(
            StaticProvider::new()
                .with_page(
                    INDEX,
                    r#"<html><body><a href="/medicines/metformin/">Metformin</a></body></html>"#,
                )
                .with_page(
                    METFORMIN,
                    r#"<html><body><main><h1>Metformin</h1>
                         <a href="/medicines/metformin/about-metformin/">About metformin</a>
                       </main></body></html>"#,
                )
                .with_page(
                    &format!("{METFORMIN}about-metformin/"),
                    "<html><body><main><h2>What metformin is used for</h2>\
                     <p>Metformin lowers blood sugar in type 2 diabetes.</p></main></body></html>",
                ),
        );
        // "metf" + "ormin" would split the name without the catalog vocabulary.
        let text = TextPipeline::new(Dictionary::from_words(["metf", "ormin", "lowers", "blood"]));

        let result = run(
            &config(None),
            provider,
            text,
            Arc::new(SilentProgress),
            &MemoryWriter::default(),
        )
        .await
        .unwrap();

        let about = &result.items[0].about;
        assert_eq!(about.paragraphs.len(), 1);
        assert_eq!(
            about.paragraphs[0].body,
            "Metformin lowers blood sugar in type 2 diabetes."
        );
    }

    #[tokio::test]
    async fn limit_takes_first_entries_in_catalog_order() {
        let provider = site();
        let shared: Arc<dyn DocumentProvider> = Arc::new(provider.clone());

        let result = run(
            &config(Some(1)),
            shared,
            TextPipeline::default(),
            Arc::new(SilentProgress),
            &MemoryWriter::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.total_found, 3);
        assert_eq!(result.attempted(), 1);
        assert_eq!(result.items[0].name, "Aciclovir");
        assert!(!provider.visits().iter().any(|v| v == AMOXICILLIN));
    }

    #[tokio::test]
    async fn unreachable_index_aborts_before_any_item() {
        let provider = StaticProvider::new().with_failure(INDEX);
        let shared: Arc<dyn DocumentProvider> = Arc::new(provider.clone());
        let writer = MemoryWriter::default();

        let err = run(
            &config(None),
            shared,
            TextPipeline::default(),
            Arc::new(SilentProgress),
            &writer,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LeafdexError::CatalogFetch { .. }));
        assert_eq!(provider.visits(), vec![INDEX.to_string()]);
        assert!(writer.written.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_catalog_writes_empty_result() {
        let provider: Arc<dyn DocumentProvider> = Arc::new(
            StaticProvider::new().with_page(INDEX, "<html><body><p>Nothing yet</p></body></html>"),
        );
        let writer = MemoryWriter::default();

        let result = run(
            &config(None),
            provider,
            TextPipeline::default(),
            Arc::new(SilentProgress),
            &writer,
        )
        .await
        .unwrap();

        assert_eq!(result.total_found, 0);
        assert_eq!(result.succeeded, 0);
        assert!(writer.written.lock().unwrap().is_some());
    }

    #[test]
    fn apply_limit_keeps_prefix() {
        let links: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| ItemLink {
                name: Some(n.to_string()),
                url: Url::parse(&format!("https://www.example.org/medicines/{n}/")).unwrap(),
            })
            .collect();
        let kept = apply_limit(links.clone(), Some(2));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].label(), "b");
        assert_eq!(apply_limit(links.clone(), None).len(), 3);
        assert_eq!(apply_limit(links, Some(10)).len(), 3);
    }
}
