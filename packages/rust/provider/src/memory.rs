//! In-memory document provider for fixtures, dry runs, and tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use leafdex_shared::{LeafdexError, Result};

use crate::{BrowsingContext, DocumentProvider, RenderedPage};

#[derive(Debug, Default)]
struct Shared {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    visits: Mutex<Vec<String>>,
    contexts: AtomicUsize,
}

/// Serves pre-registered HTML keyed by absolute URL.
///
/// Unknown URLs answer like a 404; URLs registered with
/// [`with_failure`](Self::with_failure) fail like a refused connection.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    shared: Arc<Shared>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page. Must be called before the provider is shared.
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.shared_mut().pages.insert(url.to_string(), html.into());
        self
    }

    /// Make navigation to `url` fail.
    pub fn with_failure(mut self, url: &str) -> Self {
        self.shared_mut().failing.insert(url.to_string());
        self
    }

    /// Every URL navigated so far, in order.
    pub fn visits(&self) -> Vec<String> {
        self.shared
            .visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of browsing contexts opened so far.
    pub fn contexts_opened(&self) -> usize {
        self.shared.contexts.load(Ordering::SeqCst)
    }

    fn shared_mut(&mut self) -> &mut Shared {
        Arc::get_mut(&mut self.shared).expect("StaticProvider configured after being shared")
    }
}

#[async_trait]
impl DocumentProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>> {
        self.shared.contexts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticContext {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct StaticContext {
    shared: Arc<Shared>,
}

#[async_trait]
impl BrowsingContext for StaticContext {
    async fn navigate(&mut self, url: &Url, _timeout: Duration) -> Result<RenderedPage> {
        self.shared
            .visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        // Let other tasks interleave the way real navigation would.
        tokio::task::yield_now().await;

        if self.shared.failing.contains(url.as_str()) {
            return Err(LeafdexError::Navigation(format!("{url}: connection refused")));
        }

        match self.shared.pages.get(url.as_str()) {
            Some(html) => Ok(RenderedPage::new(url.clone(), html.clone())),
            None => Err(LeafdexError::Navigation(format!("{url}: HTTP 404 Not Found"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_registered_pages() {
        let provider = StaticProvider::new()
            .with_page("https://example.com/a/", "<h1>A</h1>")
            .with_failure("https://example.com/b/");

        let mut ctx = provider.new_context().await.unwrap();
        let timeout = Duration::from_secs(1);

        let page = ctx
            .navigate(&Url::parse("https://example.com/a/").unwrap(), timeout)
            .await
            .unwrap();
        assert_eq!(page.html, "<h1>A</h1>");

        let refused = ctx
            .navigate(&Url::parse("https://example.com/b/").unwrap(), timeout)
            .await
            .unwrap_err();
        assert!(refused.to_string().contains("connection refused"));

        let missing = ctx
            .navigate(&Url::parse("https://example.com/c/").unwrap(), timeout)
            .await
            .unwrap_err();
        assert!(missing.to_string().contains("404"));

        assert_eq!(provider.visits().len(), 3);
        assert_eq!(provider.contexts_opened(), 1);
    }
}
