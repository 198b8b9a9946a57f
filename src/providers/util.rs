//! Shared plumbing for the HTTP providers.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const ATTEMPTS: usize = 3;
const RETRY_DELAY_MS: u64 = 300;

pub fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("allot/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()?)
}

/// Fetches `url` and returns the response body. Transport errors are retried
/// a fixed number of times; HTTP status errors fail immediately.
pub async fn get_text(client: &Client, url: &str) -> Result<String> {
    let mut last_err = anyhow!("Request failed: {url}");
    for attempt in 1..=ATTEMPTS {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                return response
                    .text()
                    .await
                    .context("Failed to read response body");
            }
            Ok(response) => {
                return Err(anyhow!("HTTP error: {} for {}", response.status(), url));
            }
            Err(err) => {
                debug!("Attempt {attempt}/{ATTEMPTS} failed for {url}: {err}");
                last_err = err.into();
                if attempt < ATTEMPTS {
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                }
            }
        }
    }
    Err(last_err)
}
