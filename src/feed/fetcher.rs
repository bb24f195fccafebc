use crate::error::{Error, Result};
use crate::feed::parser::FeedParser;
use crate::feed::{FeedEntry, ParsedFeed};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    timeout_duration: Duration,
    user_agent: String,
}

impl FeedFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
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

    pub async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
        debug!("Fetching feed from: {}", url);

        let parser = FeedParser::new();
        parser.validate_feed_url(url)?;

        let response = timeout(self.timeout_duration, self.fetch_response(url))
            .await
            .map_err(|_| Error::Timeout(format!("Request to {} timed out", url)))??;

        if !response.status().is_success() {
            return Err(Error::HttpError(format!(
                "HTTP {} for {}: {}",
                response.status().as_u16(),
                url,
                response.status().canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let content = timeout(self.timeout_duration, response.bytes())
            .await
            .map_err(|_| Error::Timeout(format!("Reading body from {} timed out", url)))?
            .map_err(|e| Error::HttpError(format!("Failed to read response body: {}", e)))?;

        debug!("Downloaded {} bytes from {}", content.len(), url);

        parser.parse_feed(std::io::Cursor::new(content))
    }

    async fn fetch_response(&self, url: &str) -> Result<Response> {
        self.client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/rss+xml, application/atom+xml, application/xml, text/xml, */*")
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("Request failed: {}", e)))
    }

    /// Fetch every feed concurrently; results come back in input order.
    pub async fn fetch_multiple_feeds(&self, urls: &[String]) -> Vec<(String, Result<ParsedFeed>)> {
        let futures = urls.iter().map(|url| async move {
            let result = self.fetch_feed(url).await;
            (url.clone(), result)
        });

        futures::future::join_all(futures).await
    }

    /// Flatten all feeds into one entry list, in feed order. Feeds that fail
    /// to download or parse are logged and left out.
    pub async fn fetch_entries(&self, urls: &[String]) -> Vec<FeedEntry> {
        let mut entries = Vec::new();

        for (url, result) in self.fetch_multiple_feeds(urls).await {
            match result {
                Ok(feed) => {
                    info!(
                        feed = %url,
                        entries = feed.entries.len(),
                        skipped = feed.skipped,
                        "Fetched feed '{}'", feed.title
                    );
                    entries.extend(feed.entries);
                }
                Err(e) => {
                    warn!(feed = %url, code = e.error_code(), "Failed to parse feed {}: {}", url, e);
                }
            }
        }

        entries
    }
}
