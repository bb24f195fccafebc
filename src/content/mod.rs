pub mod extractor;
pub mod fetcher;

pub use extractor::{ContentExtractor, ExtractionStrategy};
pub use fetcher::{ContentFetcher, FULL_TEXT_UNAVAILABLE};

use serde::{Deserialize, Serialize};

/// Which URL the full text is fetched from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    /// The resolved archive link.
    #[default]
    Archive,
    /// The article's live URL.
    Original,
}

/// Which elements count as the main content container: a tag from
/// `container_tags` whose `id` or `class` mentions one of `container_tokens`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSelectors {
    pub container_tokens: Vec<String>,
    pub container_tags: Vec<String>,
}

impl ContentSelectors {
    pub fn with_tokens(tokens: Vec<String>) -> Self {
        Self {
            container_tokens: tokens,
            ..Self::default()
        }
    }
}

impl Default for ContentSelectors {
    fn default() -> Self {
        Self {
            container_tokens: vec!["content".to_string()],
            container_tags: ["div", "section", "main"].iter().map(|t| t.to_string()).collect(),
        }
    }
}
