use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive lookup error: {0}")]
    ArchiveLookup(String),

    #[error("XML output error: {0}")]
    Xml(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

impl Error {
    /// Failures worth another attempt after a short delay.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self,
            Error::HttpError(_) | Error::Timeout(_) | Error::Io(_) | Error::ArchiveLookup(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::FeedParse(_) => "FEED_PARSE",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Timeout(_) => "TIMEOUT",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Config(_) => "CONFIG",
            Error::ArchiveLookup(_) => "ARCHIVE_LOOKUP",
            Error::Xml(_) => "XML",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Invalid(_) => "INVALID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_errors() {
        assert!(Error::HttpError("HTTP 503".to_string()).is_temporary());
        assert!(Error::Timeout("slow".to_string()).is_temporary());
        assert!(Error::ArchiveLookup("no snapshot".to_string()).is_temporary());
        assert!(!Error::InvalidUrl("ftp://x".to_string()).is_temporary());
        assert!(!Error::FeedParse("bad xml".to_string()).is_temporary());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Xml("x".to_string()).error_code(), "XML");
        assert_eq!(Error::Config("x".to_string()).error_code(), "CONFIG");
    }
}
