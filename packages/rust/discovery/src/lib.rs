//! Catalog discovery: fetch the index page and list every item link on it.
//!
//! The index is the only page a run cannot do without, so any failure to
//! reach it surfaces as [`LeafdexError::CatalogFetch`] and the caller aborts.

mod catalog;

use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use leafdex_provider::{DocumentProvider, RenderedPage, dismiss_consent};
use leafdex_shared::{ItemLink, LeafdexError, Result, RunConfig};

pub use catalog::build_catalog;

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// The catalog index page.
    pub index_url: Url,
    /// Path segment every item URL continues, e.g. `/medicines/`.
    pub catalog_path: String,
    /// Navigation timeout for the index page.
    pub timeout: Duration,
    /// Ordered consent-overlay matchers.
    pub consent_selectors: Vec<String>,
}

impl From<&RunConfig> for DiscoveryOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            index_url: config.index_url.clone(),
            catalog_path: config.catalog_path.clone(),
            timeout: config.timeout,
            consent_selectors: config.consent_selectors.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fetch the index page and build the catalog.
///
/// Engine start-up errors pass through unchanged; everything that goes wrong
/// on the index page itself becomes a `CatalogFetch` error.
#[instrument(skip_all, fields(url = %opts.index_url, engine = provider.name()))]
pub async fn discover(
    provider: &dyn DocumentProvider,
    opts: &DiscoveryOptions,
) -> Result<Vec<ItemLink>> {
    let mut ctx = provider.new_context().await?;

    let mut page = ctx
        .navigate(&opts.index_url, opts.timeout)
        .await
        .map_err(|e| LeafdexError::catalog_fetch(opts.index_url.as_str(), e))?;

    dismiss_consent(ctx.as_mut(), &mut page, &opts.consent_selectors).await;

    let links = catalog_from_page(&page, &opts.catalog_path);
    if links.is_empty() {
        warn!("index page yielded no catalog links");
    } else {
        info!(links = links.len(), "catalog built");
    }

    Ok(links)
}

fn catalog_from_page(page: &RenderedPage, catalog_path: &str) -> Vec<ItemLink> {
    let doc = page.document();
    build_catalog(&doc, &page.url, catalog_path)
}
