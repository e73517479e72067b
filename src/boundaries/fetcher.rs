//! HTTP fetcher for the external boundaries endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use super::BoundaryRecord;

const MAX_ATTEMPTS: u32 = 2;

/// Fetches boundary records from a boundaries endpoint
#[derive(Debug, Clone)]
pub struct BoundaryFetcher {
    client: Client,
    url: Url,
}

impl BoundaryFetcher {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid boundaries URL: {}", url))?;
        let client = Client::builder()
            .user_agent(concat!("barangay/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch every record, retrying once on transport or server errors
    pub async fn fetch(&self) -> Result<Vec<BoundaryRecord>> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.fetch_once().await {
                Ok(records) => {
                    info!("Fetched {} boundary records from {}", records.len(), self.url);
                    return Ok(records);
                }
                Err(e) if attempts < MAX_ATTEMPTS => {
                    warn!(
                        "Boundary fetch failed (attempt {}/{}): {:#}",
                        attempts, MAX_ATTEMPTS, e
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self) -> Result<Vec<BoundaryRecord>> {
        let response = self
            .client
            .get(self.url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to fetch boundaries: HTTP {}", status);
        }

        response
            .json::<Vec<BoundaryRecord>>()
            .await
            .context("Failed to parse boundaries response")
    }
}
