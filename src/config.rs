use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::archive::ArchiveMode;
use crate::content::ContentSource;
use crate::error::{Error, Result};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "combined-rss.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_fetch_content")]
    pub fetch_content: bool,

    #[serde(default)]
    pub content_source: ContentSource,

    /// `id`/`class` fragments that mark the main content container.
    #[serde(default = "default_content_tokens")]
    pub content_tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub mode: ArchiveMode,

    #[serde(default = "default_archive_prefix")]
    pub prefix: String,

    #[serde(default = "default_lookup_endpoint")]
    pub lookup_endpoint: String,

    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    #[serde(default = "default_channel_title")]
    pub title: String,

    #[serde(default = "default_channel_link")]
    pub link: String,

    #[serde(default = "default_channel_description")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub log_to_file: bool,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| Error::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the effective configuration: an explicit path must exist,
    /// otherwise `combined-rss.toml` is used when present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_with_env(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load_with_env(DEFAULT_CONFIG_FILE),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides()?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        for url in &self.feeds {
            let parsed = url::Url::parse(url)
                .map_err(|_| Error::InvalidUrl(url.clone()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::InvalidUrl(format!("Unsupported scheme: {}", url)));
            }
        }

        if self.settings.max_items == 0 {
            return Err(Error::Invalid("Max items must be greater than 0".to_string()));
        }

        if self.settings.workers == 0 {
            return Err(Error::Invalid("Worker count must be greater than 0".to_string()));
        }

        if self.settings.retry_attempts == 0 {
            return Err(Error::Invalid("Retry attempts must be greater than 0".to_string()));
        }

        if self.archive.prefix.is_empty() {
            return Err(Error::Invalid("Archive prefix cannot be empty".to_string()));
        }

        if self.archive.mode == ArchiveMode::Lookup {
            url::Url::parse(&self.archive.lookup_endpoint)
                .map_err(|_| Error::InvalidUrl(self.archive.lookup_endpoint.clone()))?;
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(max_items) = std::env::var("COMBINED_RSS_MAX_ITEMS") {
            if let Ok(val) = max_items.parse() {
                self.settings.max_items = val;
            }
        }

        if let Ok(workers) = std::env::var("COMBINED_RSS_WORKERS") {
            if let Ok(val) = workers.parse() {
                self.settings.workers = val;
            }
        }

        if let Ok(output) = std::env::var("COMBINED_RSS_OUTPUT") {
            self.output.path = PathBuf::from(output);
        }

        if let Ok(mode) = std::env::var("COMBINED_RSS_ARCHIVE_MODE") {
            self.archive.mode = mode
                .parse()
                .map_err(|e| Error::Config(format!("COMBINED_RSS_ARCHIVE_MODE: {}", e)))?;
        }

        if let Ok(level) = std::env::var("COMBINED_RSS_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            settings: Settings::default(),
            archive: ArchiveConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            workers: default_workers(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            fetch_content: default_fetch_content(),
            content_source: ContentSource::default(),
            content_tokens: default_content_tokens(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            mode: ArchiveMode::default(),
            prefix: default_archive_prefix(),
            lookup_endpoint: default_lookup_endpoint(),
            cache_file: default_cache_file(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            title: default_channel_title(),
            link: default_channel_link(),
            description: default_channel_description(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_file: default_log_file(),
            json_format: false,
        }
    }
}

fn default_feeds() -> Vec<String> {
    [
        "briefing",
        "the-economist-explains",
        "leaders",
        "asia",
        "china",
        "international",
        "united-states",
        "finance-and-economics",
        "the-world-this-week",
    ]
    .iter()
    .map(|section| format!("https://www.economist.com/{}/rss.xml", section))
    .collect()
}

fn default_max_items() -> usize { 20 }
fn default_workers() -> usize { 6 }
fn default_retry_attempts() -> usize { 2 }
fn default_retry_delay_ms() -> u64 { 2000 }
fn default_timeout() -> u64 { 30 }
fn default_user_agent() -> String {
    format!("Mozilla/5.0 (compatible; CombinedRSS/{}; +https://github.com/)", env!("CARGO_PKG_VERSION"))
}
fn default_fetch_content() -> bool { true }
fn default_content_tokens() -> Vec<String> { vec!["content".to_string()] }

fn default_archive_prefix() -> String { "https://archive.is/o/nuunc/".to_string() }
fn default_lookup_endpoint() -> String { "https://archive.org/wayback/available".to_string() }
fn default_cache_file() -> PathBuf { PathBuf::from("archive_cache.json") }

fn default_output_path() -> PathBuf { PathBuf::from("combined.xml") }
fn default_channel_title() -> String { "Combined Economist RSS (archive links)".to_string() }
fn default_channel_link() -> String { "https://github.com/".to_string() }
fn default_channel_description() -> String {
    "Combined feed with links routed through an archive and full text from archive snapshots".to_string()
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_file() -> String { "logs/combined-rss.log".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_original_tool() {
        let config = Config::default();

        assert_eq!(config.feeds.len(), 9);
        assert!(config.feeds.iter().all(|f| f.starts_with("https://www.economist.com/")));
        assert_eq!(config.settings.max_items, 20);
        assert_eq!(config.settings.workers, 6);
        assert_eq!(config.settings.retry_attempts, 2);
        assert_eq!(config.settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.archive.mode, ArchiveMode::Prefix);
        assert_eq!(config.archive.prefix, "https://archive.is/o/nuunc/");
        assert_eq!(config.output.path, PathBuf::from("combined.xml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combined-rss.toml");
        std::fs::write(&path, r#"
feeds = ["https://example.com/rss.xml"]

[settings]
max_items = 5
content_source = "original"
content_tokens = ["article-body", "story"]

[archive]
mode = "lookup"
"#).unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.feeds, vec!["https://example.com/rss.xml"]);
        assert_eq!(config.settings.max_items, 5);
        assert_eq!(config.settings.workers, 6);
        assert_eq!(config.settings.content_source, ContentSource::Original);
        assert_eq!(config.settings.content_tokens, vec!["article-body", "story"]);
        assert_eq!(config.archive.mode, ArchiveMode::Lookup);
        assert_eq!(config.archive.prefix, "https://archive.is/o/nuunc/");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/combined-rss.toml");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.feeds.push("ftp://example.com/feed".to_string());
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));

        let mut config = Config::default();
        config.settings.max_items = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.settings.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.archive.prefix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_archive_mode_env_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combined-rss.toml");
        std::fs::write(&path, "feeds = []\n").unwrap();

        std::env::set_var("COMBINED_RSS_ARCHIVE_MODE", "wayback");
        let result = Config::load_with_env(&path);
        std::env::remove_var("COMBINED_RSS_ARCHIVE_MODE");

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("wayback")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "feeds = [unterminated").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }
}
