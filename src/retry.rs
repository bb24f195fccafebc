use std::future::Future;
use std::time::Duration;
use crate::config::Settings;
use crate::error::Result;

/// Fixed-delay retry: `attempts` total tries, `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: usize, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.retry_attempts, settings.retry_delay())
    }

    /// Run `op` until it succeeds, fails with a non-temporary error, or the
    /// attempts are used up. The last error is returned.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_temporary() && attempt < self.attempts => {
                    tracing::debug!(
                        error = %e,
                        attempt,
                        max_attempts = self.attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        "Retrying {} after failure", what
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
