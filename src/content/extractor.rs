use select::document::Document;
use select::node::Node;
use select::predicate::{Name, Predicate};
use crate::content::ContentSelectors;

/// One way of locating the main content of a page.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Outer HTML of the matched element, or `None` when nothing matches.
    fn extract(&self, document: &Document) -> Option<String>;
}

fn has_text(node: &Node) -> bool {
    !node.text().trim().is_empty()
}

/// The first `<article>` element, if it holds any text.
pub struct ArticleElement;

impl ExtractionStrategy for ArticleElement {
    fn name(&self) -> &'static str {
        "article"
    }

    fn extract(&self, document: &Document) -> Option<String> {
        document
            .find(Name("article"))
            .next()
            .filter(has_text)
            .map(|node| node.html())
    }
}

/// First container element whose `id` or `class` mentions one of the tokens.
pub struct ContentContainer {
    tokens: Vec<String>,
    tags: Vec<String>,
}

impl ContentContainer {
    pub fn new(selectors: ContentSelectors) -> Self {
        Self {
            tokens: selectors.container_tokens.into_iter().map(|t| t.to_lowercase()).collect(),
            tags: selectors.container_tags.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

struct AttrMentions<'a> {
    tokens: &'a [String],
    tags: &'a [String],
}

impl Predicate for AttrMentions<'_> {
    fn matches(&self, node: &Node) -> bool {
        let is_container = node
            .name()
            .map_or(false, |name| self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(name)));
        if !is_container {
            return false;
        }

        ["id", "class"].iter().any(|attr| {
            node.attr(attr).map_or(false, |value| {
                let value = value.to_lowercase();
                self.tokens.iter().any(|token| value.contains(token.as_str()))
            })
        })
    }
}

impl ExtractionStrategy for ContentContainer {
    fn name(&self) -> &'static str {
        "content-container"
    }

    fn extract(&self, document: &Document) -> Option<String> {
        if self.tokens.is_empty() {
            return None;
        }
        document
            .find(AttrMentions {
                tokens: &self.tokens,
                tags: &self.tags,
            })
            .next()
            .map(|node| node.html())
    }
}

/// The whole `<body>`.
pub struct DocumentBody;

impl ExtractionStrategy for DocumentBody {
    fn name(&self) -> &'static str {
        "body"
    }

    fn extract(&self, document: &Document) -> Option<String> {
        document
            .find(Name("body"))
            .next()
            .filter(has_text)
            .map(|node| node.html())
    }
}

/// Best-effort main-content extraction: strategies are tried in order and
/// the raw page is returned when none of them match.
pub struct ContentExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self::with_selectors(ContentSelectors::default())
    }

    pub fn with_selectors(selectors: ContentSelectors) -> Self {
        Self {
            strategies: vec![
                Box::new(ArticleElement),
                Box::new(ContentContainer::new(selectors)),
                Box::new(DocumentBody),
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Returns the extracted fragment and the name of the strategy that produced it.
    pub fn extract(&self, html: &str) -> (String, &'static str) {
        let document = Document::from(html);

        for strategy in &self.strategies {
            if let Some(fragment) = strategy.extract(&document) {
                return (fragment, strategy.name());
            }
        }

        (html.to_string(), "raw")
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}
