pub mod fetcher;
pub mod parser;
pub mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One article as read from a source feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    /// Uniqueness key across all source feeds.
    pub original_link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

/// A selected entry with its archive link and recovered content attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub entry: FeedEntry,
    pub archive_link: String,
    pub full_content: String,
}

#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
    /// Entries dropped because they carried no link.
    pub skipped: usize,
}

impl ResolvedEntry {
    pub fn new(entry: FeedEntry, archive_link: String, full_content: String) -> Self {
        Self {
            entry,
            archive_link,
            full_content,
        }
    }
}
