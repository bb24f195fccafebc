use crate::content::ContentExtractor;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

pub const FULL_TEXT_UNAVAILABLE: &str = "Full text not available.";

/// Downloads article pages and reduces them to their main content.
#[derive(Clone)]
pub struct ContentFetcher {
    client: Client,
    extractor: Arc<ContentExtractor>,
    retry: RetryPolicy,
    timeout_duration: Duration,
    user_agent: String,
}

impl ContentFetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            extractor: Arc::new(ContentExtractor::new()),
            retry,
            timeout_duration: Duration::from_secs(30),
            user_agent: format!("CombinedRSS/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Main content of the page at `url`, or a marked placeholder once every
    /// attempt has failed. Never returns an error.
    pub async fn fetch_main_content(&self, url: &str) -> String {
        match self.retry.run("content fetch", || self.fetch_page(url)).await {
            Ok(page) => {
                let (fragment, strategy) = self.extractor.extract(&page);
                debug!(url = %url, strategy, bytes = fragment.len(), "Extracted main content");
                fragment
            }
            Err(e) => {
                warn!(url = %url, code = e.error_code(), "Giving up on content: {}", e);
                failure_placeholder(url, &e)
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let request = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send();

        let response = timeout(self.timeout_duration, request)
            .await
            .map_err(|_| Error::Timeout(format!("Request to {} timed out", url)))?
            .map_err(|e| Error::HttpError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::HttpError(format!(
                "HTTP {} for {}",
                response.status().as_u16(),
                url
            )));
        }

        timeout(self.timeout_duration, response.text())
            .await
            .map_err(|_| Error::Timeout(format!("Reading body from {} timed out", url)))?
            .map_err(|e| Error::HttpError(format!("Failed to read response body: {}", e)))
    }
}

/// HTML comment naming the URL and failure, followed by the unavailable notice.
pub fn failure_placeholder(url: &str, error: &Error) -> String {
    let mut note = format!("Failed to fetch content ({}): {}", url, error);
    // "--" may not appear inside an HTML comment
    while note.contains("--") {
        note = note.replace("--", "- -");
    }
    format!("<!-- {} -->{}", note, FULL_TEXT_UNAVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> ContentFetcher {
        ContentFetcher::new(Client::new(), RetryPolicy::new(2, Duration::from_millis(5)))
    }

    #[tokio::test]
    async fn test_fetch_extracts_article() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><header>Nav</header><article><p>The story</p></article></body></html>",
            ))
            .mount(&server)
            .await;

        let content = fetcher().fetch_main_content(&format!("{}/story", server.uri())).await;

        assert!(content.starts_with("<article"));
        assert!(content.contains("The story"));
        assert!(!content.contains("Nav"));
    }

    #[tokio::test]
    async fn test_failure_returns_placeholder_after_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let url = format!("{}/gone", server.uri());
        let content = fetcher().fetch_main_content(&url).await;

        assert!(content.starts_with("<!-- Failed to fetch content ("));
        assert!(content.contains(&url));
        assert!(content.contains("502"));
        assert!(content.ends_with(FULL_TEXT_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_timeout_returns_placeholder() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let content = fetcher()
            .with_timeout(Duration::from_millis(50))
            .fetch_main_content(&format!("{}/slow", server.uri()))
            .await;

        assert!(content.contains("timed out"));
        assert!(content.ends_with(FULL_TEXT_UNAVAILABLE));
    }

    #[test]
    fn test_placeholder_keeps_comment_well_formed() {
        let placeholder = failure_placeholder("https://example.com/a---b", &Error::HttpError("a -- b".to_string()));
        let inner = placeholder
            .strip_prefix("<!--")
            .and_then(|s| s.split_once("-->"))
            .map(|(comment, _)| comment)
            .unwrap();
        assert!(!inner.contains("--"));
    }
}
