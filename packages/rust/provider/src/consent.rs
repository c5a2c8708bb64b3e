//! Best-effort dismissal of cookie/consent overlays.

use tracing::debug;

use crate::{BrowsingContext, RenderedPage};

/// Try each selector in order and stop at the first that dismisses something.
///
/// Returns the selector that worked. A missing overlay, an invalid selector,
/// or an engine error is never fatal.
pub async fn dismiss_consent(
    ctx: &mut dyn BrowsingContext,
    page: &mut RenderedPage,
    selectors: &[String],
) -> Option<String> {
    for selector in selectors {
        match ctx.dismiss(page, selector).await {
            Ok(true) => {
                debug!(url = %page.url, %selector, "consent overlay dismissed");
                return Some(selector.clone());
            }
            Ok(false) => {}
            Err(e) => debug!(url = %page.url, %selector, error = %e, "consent matcher failed"),
        }
    }
    None
}
