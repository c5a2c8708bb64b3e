//! Plain-HTTP document provider.
//!
//! Each browsing context owns its own `reqwest` client with a private cookie
//! jar, so one item's session state never leaks into another's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use leafdex_shared::{LeafdexError, Result};

use crate::{BrowsingContext, DocumentProvider, RenderedPage};

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("leafdex/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per navigation.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Document provider backed by plain HTTP GETs.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    user_agent: String,
}

impl HttpProvider {
    /// Create the provider, failing if the HTTP engine cannot be initialized.
    pub fn new() -> Result<Self> {
        let provider = Self {
            user_agent: USER_AGENT.to_string(),
        };
        // Surface TLS/backend problems before any discovery starts.
        provider.build_client()?;
        Ok(provider)
    }

    fn build_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(&self.user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .cookie_store(true)
            .build()
            .map_err(|e| LeafdexError::Engine(format!("failed to build HTTP client: {e}")))
    }
}

#[async_trait]
impl DocumentProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>> {
        Ok(Box::new(HttpContext {
            client: self.build_client()?,
        }))
    }
}

/// One isolated HTTP session.
struct HttpContext {
    client: Client,
}

#[async_trait]
impl BrowsingContext for HttpContext {
    #[instrument(skip_all, fields(url = %url))]
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<RenderedPage> {
        debug!(timeout_ms = timeout.as_millis(), "navigating");

        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LeafdexError::Navigation(format!(
                        "{url}: timed out after {}ms",
                        timeout.as_millis()
                    ))
                } else {
                    LeafdexError::Navigation(format!("{url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeafdexError::Navigation(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(LeafdexError::Navigation(format!(
                    "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| LeafdexError::Navigation(format!("{url}: body read failed: {e}")))?;

        debug!(final_url = %final_url, bytes = body.len(), "page rendered");
        Ok(RenderedPage::new(final_url, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn mount_page(server: &wiremock::MockServer, path: &str, body: &str) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn navigate_returns_rendered_page() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/medicines/", "<html><body><h1>Medicines A to Z</h1></body></html>").await;

        let provider = HttpProvider::new().unwrap();
        let mut ctx = provider.new_context().await.unwrap();
        let url = Url::parse(&format!("{}/medicines/", server.uri())).unwrap();

        let page = ctx.navigate(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(page.url, url);
        assert!(page.html.contains("Medicines A to Z"));
    }

    #[tokio::test]
    async fn navigate_fails_on_http_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/medicines/missing/"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = HttpProvider::new().unwrap();
        let mut ctx = provider.new_context().await.unwrap();
        let url = Url::parse(&format!("{}/medicines/missing/", server.uri())).unwrap();

        let err = ctx.navigate(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, LeafdexError::Navigation(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn navigate_honours_timeout() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/slow/"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<p>late</p>")
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let provider = HttpProvider::new().unwrap();
        let mut ctx = provider.new_context().await.unwrap();
        let url = Url::parse(&format!("{}/slow/", server.uri())).unwrap();

        let err = ctx.navigate(&url, Duration::from_millis(50)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn dismiss_on_http_snapshot() {
        let server = wiremock::MockServer::start().await;
        mount_page(
            &server,
            "/page/",
            r#"<html><body><div id="nhsuk-cookie-banner"><h2>Cookies on the website</h2></div><main><p>Body</p></main></body></html>"#,
        )
        .await;

        let provider = HttpProvider::new().unwrap();
        let mut ctx = provider.new_context().await.unwrap();
        let url = Url::parse(&format!("{}/page/", server.uri())).unwrap();
        let mut page = ctx.navigate(&url, Duration::from_secs(5)).await.unwrap();

        assert!(ctx.dismiss(&mut page, "#nhsuk-cookie-banner").await.unwrap());
        assert!(!page.html.contains("Cookies on the website"));
    }
}
