//! Document provider capability: the only way leafdex talks to the web.
//!
//! Extraction code depends on [`DocumentProvider`] and [`BrowsingContext`],
//! never on a concrete engine. An engine renders a URL into a
//! [`RenderedPage`]; all DOM access then goes through the [`dom`] helpers
//! over the parsed snapshot. Consent overlays are cleared with
//! [`dismiss_consent`] before a page is read.
//!
//! Built-in engines:
//! - [`HttpProvider`] — plain HTTP via `reqwest`, one cookie jar per context
//! - [`StaticProvider`] — in-memory pages for fixtures and tests

mod consent;
pub mod dom;
mod http;
mod memory;

use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use leafdex_shared::Result;

pub use consent::dismiss_consent;
pub use http::HttpProvider;
pub use memory::StaticProvider;

// ---------------------------------------------------------------------------
// RenderedPage
// ---------------------------------------------------------------------------

/// A navigated page: final URL after redirects plus its rendered markup.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL (base for resolving relative links).
    pub url: Url,
    /// Rendered HTML.
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// Parse the snapshot for querying.
    ///
    /// The returned document is not `Send`; parse and query inside synchronous
    /// code and never hold it across an `.await`.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A page-rendering engine.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Human-readable engine name for tracing.
    fn name(&self) -> &str;

    /// Open a fresh browsing context with no shared session state.
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>>;
}

/// An isolated session (cookies, page state) inside a provider.
#[async_trait]
pub trait BrowsingContext: Send {
    /// Navigate to `url`, failing if it does not complete within `timeout`.
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<RenderedPage>;

    /// Best-effort dismissal of an overlay matching `selector`.
    ///
    /// Returns `Ok(true)` if something was dismissed. The default removes
    /// matching nodes from the snapshot, which is what a click on a static
    /// page amounts to.
    async fn dismiss(&mut self, page: &mut RenderedPage, selector: &str) -> Result<bool> {
        let selector = dom::selector(selector)?;
        match dom::remove_matching(&page.html, &selector) {
            Some(html) => {
                page.html = html;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
