use std::path::PathBuf;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::archive::{ArchiveMode, ArchiveResolver, Resolution, SnapshotLookup};
use crate::config::Config;
use crate::content::{ContentExtractor, ContentFetcher, ContentSelectors, ContentSource, FULL_TEXT_UNAVAILABLE};
use crate::error::{Error, Result};
use crate::feed::fetcher::FeedFetcher;
use crate::feed::writer::{ChannelInfo, FeedWriter};
use crate::feed::{FeedEntry, ResolvedEntry};
use crate::retry::RetryPolicy;
use crate::storage::ArchiveCache;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub entries_read: usize,
    pub items_written: usize,
    pub cache_added: usize,
    pub output_path: PathBuf,
}

/// Shared HTTP client; redirects are followed so archive links reach the snapshot.
pub fn build_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.settings.request_timeout())
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .user_agent(config.settings.user_agent.clone())
        .build()
        .map_err(|e| Error::HttpError(format!("Failed to create HTTP client: {}", e)))
}

pub struct Pipeline {
    config: Config,
    feed_fetcher: FeedFetcher,
    aggregator: Aggregator,
    resolver: ArchiveResolver,
    content_fetcher: ContentFetcher,
    writer: FeedWriter,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = build_client(&config)?;
        let settings = &config.settings;
        let retry = RetryPolicy::from_settings(settings);

        let feed_fetcher = FeedFetcher::new(client.clone())
            .with_timeout(settings.request_timeout())
            .with_user_agent(settings.user_agent.clone());

        let resolver = match config.archive.mode {
            ArchiveMode::Prefix => ArchiveResolver::prefix(config.archive.prefix.clone()),
            ArchiveMode::Lookup => {
                let lookup = SnapshotLookup::new(client.clone(), config.archive.lookup_endpoint.clone(), retry)
                    .with_timeout(settings.request_timeout());
                ArchiveResolver::lookup(config.archive.prefix.clone(), lookup)
            }
        };

        let extractor = ContentExtractor::with_selectors(ContentSelectors::with_tokens(settings.content_tokens.clone()));
        let content_fetcher = ContentFetcher::new(client, retry)
            .with_timeout(settings.request_timeout())
            .with_user_agent(settings.user_agent.clone())
            .with_extractor(extractor);

        let writer = FeedWriter::new(ChannelInfo {
            title: config.output.title.clone(),
            link: config.output.link.clone(),
            description: config.output.description.clone(),
        });

        let aggregator = Aggregator::new(settings.max_items);

        Ok(Self {
            config,
            aggregator,
            feed_fetcher,
            resolver,
            content_fetcher,
            writer,
        })
    }

    /// Read feeds, select, resolve and fetch, then write the combined document.
    /// Only an output write failure aborts the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let lookup_mode = self.resolver.mode() == ArchiveMode::Lookup;
        let cache_path = &self.config.archive.cache_file;

        let mut cache = if lookup_mode {
            ArchiveCache::load(cache_path)
        } else {
            ArchiveCache::new()
        };

        let entries = self.feed_fetcher.fetch_entries(&self.config.feeds).await;
        let entries_read = entries.len();
        let selected = self.aggregator.aggregate(entries);

        let (resolved, additions) = self.resolve_all(selected, &cache).await;

        let output_path = self.config.output.path.clone();
        self.writer.write_to_path(&resolved, &output_path)?;

        let cache_added = cache.merge(additions);
        if lookup_mode {
            if let Err(e) = self.persist_cache(&cache, cache_added) {
                warn!(
                    path = %cache_path.display(),
                    code = e.error_code(),
                    "Failed to save archive cache: {}", e
                );
            }
        }

        Ok(RunSummary {
            entries_read,
            items_written: resolved.len(),
            cache_added,
            output_path,
        })
    }

    fn persist_cache(&self, cache: &ArchiveCache, added: usize) -> Result<()> {
        let path = &self.config.archive.cache_file;
        if added == 0 && path.exists() {
            debug!("Archive cache unchanged, not rewriting {}", path.display());
            return Ok(());
        }
        cache.save(path)
    }

    /// Resolve and fetch every selected entry on a pool of `workers` tasks.
    /// Returns the entries in selection order plus the new cache mappings.
    pub async fn resolve_all(
        &self,
        selected: Vec<FeedEntry>,
        cache: &ArchiveCache,
    ) -> (Vec<ResolvedEntry>, Vec<(String, String)>) {
        let workers = self.config.settings.workers.max(1);
        info!(entries = selected.len(), workers, "Resolving archive links and content");

        let mut results: Vec<(usize, Resolution, String)> = stream::iter(selected.iter().enumerate())
            .map(|(index, entry)| async move {
                let resolution = self.resolver.resolve(&entry.original_link, cache).await;
                let content = self.fetch_content(entry, &resolution).await;
                (index, resolution, content)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        results.sort_by_key(|(index, _, _)| *index);

        let mut additions = Vec::new();
        let resolved = selected
            .into_iter()
            .zip(results)
            .map(|(entry, (_, resolution, content))| {
                if resolution.is_cacheable() {
                    additions.push((entry.original_link.clone(), resolution.archive_link.clone()));
                }
                ResolvedEntry::new(entry, resolution.archive_link, content)
            })
            .collect();

        (resolved, additions)
    }

    async fn fetch_content(&self, entry: &FeedEntry, resolution: &Resolution) -> String {
        if !self.config.settings.fetch_content {
            return FULL_TEXT_UNAVAILABLE.to_string();
        }

        let target = match self.config.settings.content_source {
            ContentSource::Archive => &resolution.archive_link,
            ContentSource::Original => &entry.original_link,
        };
        self.content_fetcher.fetch_main_content(target).await
    }
}
