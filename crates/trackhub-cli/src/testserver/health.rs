//! Health-check polling for the local test backend.

use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("{url} did not respond with HTTP 200 within {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// Block until the URL responds with HTTP 200 or the deadline passes.
/// Connection errors are retried silently until the timeout.
pub async fn wait_for_http_200(url: &str, timeout: Duration) -> Result<(), HealthError> {
    let client = reqwest::Client::new();
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        // Give each attempt at least one second regardless of remaining time.
        let attempt_timeout = remaining.max(Duration::from_secs(1));

        if let Ok(response) = client.get(url).timeout(attempt_timeout).send().await
            && response.status() == reqwest::StatusCode::OK
        {
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(HealthError::Timeout {
                url: url.to_string(),
                timeout,
            });
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
