use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use crate::error::{Error, Result};

/// Original article link → archive link, persisted as a flat JSON object.
///
/// Entries are never replaced once present: a cached archive link is
/// authoritative for the rest of the run and for later runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveCache {
    entries: BTreeMap<String, String>,
}

impl ArchiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache file. A missing file or one that does not hold a JSON
    /// object of strings yields an empty cache.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Archive cache file does not exist: {}", path.display());
            return Self::new();
        }

        match Self::read(path) {
            Ok(cache) => {
                tracing::info!("Loaded archive cache: {} links from {}", cache.len(), path.display());
                cache
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable archive cache '{}': {}", path.display(), e);
                Self::new()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Io(e))?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    /// Persist via a temp file in the same directory, then rename over the target.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json_content = serde_json::to_string_pretty(&self.entries)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json_content.as_bytes())?;
        temp.persist(path)?;

        tracing::info!("Saved archive cache: {} links to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn get(&self, original_link: &str) -> Option<&str> {
        self.entries.get(original_link).map(String::as_str)
    }

    pub fn contains(&self, original_link: &str) -> bool {
        self.entries.contains_key(original_link)
    }

    /// Insert a new mapping. Returns `false` and keeps the existing value
    /// when the link is already cached.
    pub fn insert(&mut self, original_link: String, archive_link: String) -> bool {
        if self.contains(&original_link) {
            return false;
        }
        self.entries.insert(original_link, archive_link);
        true
    }

    /// Merge mappings produced during a run; returns how many were new.
    pub fn merge<I>(&mut self, additions: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        additions
            .into_iter()
            .map(|(original, archive)| self.insert(original, archive))
            .filter(|added| *added)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for ArchiveCache {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut cache = Self::new();
        cache.merge(iter);
        cache
    }
}
