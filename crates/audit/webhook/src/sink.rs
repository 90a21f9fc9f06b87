use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use iyashi_audit::{AuditEntry, AuditError, AuditSink};

/// Default timeout for collector requests. Entries are recorded off the
/// response path, so this bounds background task lifetime only.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Audit sink that POSTs entries to an HTTP collector.
pub struct WebhookAuditSink {
    collector_url: String,
    client: Client,
}

impl WebhookAuditSink {
    /// Create a sink for the given collector URL.
    pub fn new(collector_url: impl Into<String>) -> Result<Self, AuditError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AuditError::Collector(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            collector_url: collector_url.into(),
            client,
        })
    }

    /// Create a sink with a caller-supplied client (shared pool or tests).
    pub fn with_client(collector_url: impl Into<String>, client: Client) -> Self {
        Self {
            collector_url: collector_url.into(),
            client,
        }
    }
}

#[async_trait]
impl AuditSink for WebhookAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        debug!(action = %entry.action, "posting audit entry to collector");

        let response = self
            .client
            .post(&self.collector_url)
            .json(&entry)
            .send()
            .await
            .map_err(|e| AuditError::Collector(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::Collector(format!(
                "collector returned status {status}"
            )));
        }
        Ok(())
    }
}
