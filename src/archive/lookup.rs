use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    url: String,
    #[serde(default)]
    available: Option<bool>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Client for a snapshot-availability API (`GET {endpoint}?url=...`).
#[derive(Debug, Clone)]
pub struct SnapshotLookup {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
    timeout_duration: Duration,
}

impl SnapshotLookup {
    pub fn new(client: Client, endpoint: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            retry,
            timeout_duration: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    /// Closest snapshot URL for `original_link`, retried per the policy.
    pub async fn closest_snapshot(&self, original_link: &str) -> Result<String> {
        self.retry
            .run("snapshot lookup", || self.query(original_link))
            .await
    }

    async fn query(&self, original_link: &str) -> Result<String> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("url", original_link)])
            .send();

        let response = timeout(self.timeout_duration, request)
            .await
            .map_err(|_| Error::Timeout(format!("Snapshot lookup for {} timed out", original_link)))?
            .map_err(|e| Error::HttpError(format!("Snapshot lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::HttpError(format!(
                "HTTP {} from snapshot service for {}",
                response.status().as_u16(),
                original_link
            )));
        }

        let body: AvailabilityResponse = timeout(self.timeout_duration, response.json())
            .await
            .map_err(|_| Error::Timeout(format!("Snapshot lookup for {} timed out", original_link)))?
            .map_err(|e| Error::ArchiveLookup(format!("Unexpected snapshot response: {}", e)))?;

        match body.archived_snapshots.closest {
            Some(snapshot) if snapshot.available != Some(false) && !snapshot.url.is_empty() => {
                debug!(
                    link = %original_link,
                    timestamp = snapshot.timestamp.as_deref().unwrap_or("unknown"),
                    "Found snapshot {}", snapshot.url
                );
                Ok(snapshot.url)
            }
            _ => Err(Error::ArchiveLookup(format!("No snapshot available for {}", original_link))),
        }
    }
}
