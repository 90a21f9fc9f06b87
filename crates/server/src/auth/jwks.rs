use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::error::AuthError;

/// Timeout for JWKS discovery requests.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Cached verification key set, fetched from the discovery endpoint.
///
/// Lazily populated on first use behind a single-flight mutex, so
/// concurrent first requests trigger exactly one fetch. Reads on the
/// request path take the `RwLock` read side only. The set is replaced
/// wholesale by [`refresh`](Self::refresh): from the periodic refresh
/// task or when a token references an unknown key ID after rotation.
pub struct KeySetCache {
    discovery_uri: String,
    client: reqwest::Client,
    keys: RwLock<Option<Arc<JwkSet>>>,
    fetch_guard: Mutex<()>,
}

impl KeySetCache {
    /// Create a cache for the given discovery URI.
    pub fn new(discovery_uri: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::KeySet(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            discovery_uri: discovery_uri.into(),
            client,
            keys: RwLock::new(None),
            fetch_guard: Mutex::new(()),
        })
    }

    /// The current key set, fetching it on first use.
    pub async fn current(&self) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(keys) = self.keys.read().await.as_ref() {
            return Ok(Arc::clone(keys));
        }

        // Single-flight: first caller fetches, the rest wait and re-check.
        let _guard = self.fetch_guard.lock().await;
        if let Some(keys) = self.keys.read().await.as_ref() {
            return Ok(Arc::clone(keys));
        }
        self.fetch().await
    }

    /// Force a re-fetch, replacing the cached set on success. The
    /// previous set stays in place when the fetch fails.
    pub async fn refresh(&self) -> Result<Arc<JwkSet>, AuthError> {
        let _guard = self.fetch_guard.lock().await;
        self.fetch().await
    }

    async fn fetch(&self) -> Result<Arc<JwkSet>, AuthError> {
        let set: JwkSet = self
            .client
            .get(&self.discovery_uri)
            .send()
            .await
            .map_err(|e| AuthError::KeySet(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::KeySet(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::KeySet(e.to_string()))?;

        let set = Arc::new(set);
        *self.keys.write().await = Some(Arc::clone(&set));
        info!(keys = set.keys.len(), "verification key set loaded");
        Ok(set)
    }

    /// Spawn the out-of-band refresh task.
    ///
    /// Returns a `JoinHandle` that can be aborted to stop refreshing. A
    /// failed refresh keeps the previous keys and is retried on the next
    /// tick.
    pub fn spawn_refresh_task(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so the lazy
            // first fetch stays on the request path's single-flight.
            timer.tick().await;
            loop {
                timer.tick().await;
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "key set refresh failed, keeping previous keys");
                }
            }
        })
    }
}
