pub mod lookup;

pub use lookup::SnapshotLookup;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::error::{Error, Result};
use crate::storage::ArchiveCache;

/// How original links are turned into archive links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveMode {
    /// `prefix + original_link`, no network access.
    #[default]
    Prefix,
    /// Ask a snapshot-availability service, caching the answer.
    Lookup,
}

impl std::str::FromStr for ArchiveMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(Self::Prefix),
            "lookup" => Ok(Self::Lookup),
            other => Err(Error::Config(format!(
                "Unknown archive mode '{}', expected 'prefix' or 'lookup'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Prefix,
    Cache,
    Lookup,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub archive_link: String,
    pub source: ResolutionSource,
}

impl Resolution {
    /// Whether this result should be added to the archive cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(self.source, ResolutionSource::Lookup | ResolutionSource::Fallback)
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveResolver {
    prefix: String,
    lookup: Option<SnapshotLookup>,
}

impl ArchiveResolver {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            lookup: None,
        }
    }

    /// Lookup mode; `prefix` is still used as the fallback when no snapshot is found.
    pub fn lookup(prefix: impl Into<String>, lookup: SnapshotLookup) -> Self {
        Self {
            prefix: prefix.into(),
            lookup: Some(lookup),
        }
    }

    pub fn mode(&self) -> ArchiveMode {
        if self.lookup.is_some() {
            ArchiveMode::Lookup
        } else {
            ArchiveMode::Prefix
        }
    }

    fn prefixed(&self, original_link: &str) -> String {
        format!("{}{}", self.prefix, original_link)
    }

    /// Map an original link to its archive link. Never fails: lookup errors
    /// degrade to the prefix form.
    pub async fn resolve(&self, original_link: &str, cache: &ArchiveCache) -> Resolution {
        let Some(lookup) = &self.lookup else {
            return Resolution {
                archive_link: self.prefixed(original_link),
                source: ResolutionSource::Prefix,
            };
        };

        if let Some(cached) = cache.get(original_link) {
            debug!(link = %original_link, "Archive cache hit");
            return Resolution {
                archive_link: cached.to_string(),
                source: ResolutionSource::Cache,
            };
        }

        match lookup.closest_snapshot(original_link).await {
            Ok(archive_link) => Resolution {
                archive_link,
                source: ResolutionSource::Lookup,
            },
            Err(e) => {
                warn!(link = %original_link, "Snapshot lookup failed, using prefix fallback: {}", e);
                Resolution {
                    archive_link: self.prefixed(original_link),
                    source: ResolutionSource::Fallback,
                }
            }
        }
    }
}
