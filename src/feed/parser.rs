use crate::feed::{FeedEntry, ParsedFeed};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser as feed_parser;
use std::io::BufRead;
use tracing::debug;

pub struct FeedParser;

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS or Atom document, stamping undated entries with the current time.
    pub fn parse_feed<R: BufRead>(&self, reader: R) -> Result<ParsedFeed> {
        self.parse_feed_at(reader, Utc::now())
    }

    /// Parse with an explicit fallback timestamp for entries that carry
    /// neither a published nor an updated date.
    pub fn parse_feed_at<R: BufRead>(&self, reader: R, fetched_at: DateTime<Utc>) -> Result<ParsedFeed> {
        let feed = feed_parser::parse(reader)
            .map_err(|e| Error::FeedParse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content).unwrap_or_else(|| "Untitled Feed".to_string());

        let mut entries = Vec::with_capacity(feed.entries.len());
        let mut skipped = 0;

        for entry in feed.entries {
            let Some(original_link) = entry_link(&entry) else {
                debug!("Skipping entry without link: {}", entry.id);
                skipped += 1;
                continue;
            };

            let title = entry.title.map(|t| t.content).unwrap_or_else(|| "Untitled".to_string());
            let summary = entry.summary.map(|s| s.content).unwrap_or_default();
            let published_at = entry.published.or(entry.updated).unwrap_or(fetched_at);

            entries.push(FeedEntry {
                title,
                original_link,
                summary,
                published_at,
            });
        }

        Ok(ParsedFeed {
            title,
            entries,
            skipped,
        })
    }

    pub fn validate_feed_url(&self, url: &str) -> Result<()> {
        let parsed_url = url::Url::parse(url)
            .map_err(|e| Error::InvalidUrl(format!("Invalid URL: {}", e)))?;

        match parsed_url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::InvalidUrl(format!("Unsupported scheme: {}", scheme))),
        }
    }
}

/// The entry's `alternate` link (a link without `rel` counts as one), else its
/// first link. RSS items with no `<link>` fall back to a permalink guid.
fn entry_link(entry: &Entry) -> Option<String> {
    let linked = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty());

    linked.or_else(|| {
        let id = entry.id.trim();
        url::Url::parse(id)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(|_| id.to_string())
    })
}
