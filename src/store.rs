//! Result store client.
//!
//! Persists the latest fleet run summary for later retrieval. The write
//! is fire-and-forget relative to the main response: failures are logged
//! and swallowed, never surfaced as pipeline failures, and the store is
//! never read back within a run.

use crate::config::StoreConfig;
use crate::models::FleetRunSummary;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the external result store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl StoreClient {
    /// Create a client from the store settings. An empty endpoint
    /// disables persistence entirely.
    pub fn new(config: &StoreConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            endpoint: config.endpoint.clone(),
        }
    }

    /// Persist a run summary, best-effort. Any failure is logged at
    /// warn level and swallowed.
    pub async fn store(&self, summary: &FleetRunSummary) {
        if self.endpoint.is_empty() {
            debug!("Result store disabled; skipping persistence");
            return;
        }

        match self.try_store(summary).await {
            Ok(()) => debug!("Persisted run summary {}", summary.run_id),
            Err(e) => warn!("Result store write failed (ignored): {}", e),
        }
    }

    async fn try_store(&self, summary: &FleetRunSummary) -> Result<(), String> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(summary)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("store answered HTTP {}", response.status()));
        }

        Ok(())
    }
}
