use std::collections::HashSet;
use tracing::info;
use crate::feed::FeedEntry;

pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Merges entries from all feeds into the newest-first selection.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    max_items: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

impl Aggregator {
    pub fn new(max_items: usize) -> Self {
        Self { max_items }
    }

    /// Drop repeated links (first occurrence wins), order newest first
    /// keeping input order for equal timestamps, and keep at most `max_items`.
    pub fn aggregate(&self, entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
        let total = entries.len();
        let mut seen = HashSet::with_capacity(total);

        let mut unique: Vec<FeedEntry> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.original_link.clone()))
            .collect();
        let duplicates = total - unique.len();

        // sort_by is stable
        unique.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        unique.truncate(self.max_items);

        info!(
            total,
            duplicates,
            selected = unique.len(),
            max_items = self.max_items,
            "Aggregated feed entries"
        );

        unique
    }
}
