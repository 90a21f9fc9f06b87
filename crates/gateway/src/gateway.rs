use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use iyashi_audit::{AuditEntry, AuditSink};
use iyashi_core::CallerIdentity;

use crate::audit_helpers;
use crate::disclosure;
use crate::error::GatewayError;
use crate::forward::UpstreamForwarder;
use crate::metrics::GatewayMetrics;
use crate::policy::PolicyTable;

/// The filtered reply handed back to the HTTP layer.
#[derive(Debug)]
pub struct ProxyResponse {
    /// The upstream's original status code.
    pub status: StatusCode,
    /// Content type of the body.
    pub content_type: Option<HeaderValue>,
    /// Response body, disclosure-filtered when it was JSON.
    pub body: Bytes,
}

/// The per-request pipeline: authorize, forward, filter.
///
/// Immutable after construction; share it behind a plain `Arc`. Nothing
/// here mutates during request handling, so there is no lock on the hot
/// path.
pub struct Gateway {
    policy: PolicyTable,
    forwarder: UpstreamForwarder,
    audit: Option<Arc<dyn AuditSink>>,
    sensitive_prefixes: Vec<String>,
    metrics: Arc<GatewayMetrics>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("sensitive_prefixes", &self.sensitive_prefixes)
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub(crate) fn new(
        policy: PolicyTable,
        forwarder: UpstreamForwarder,
        audit: Option<Arc<dyn AuditSink>>,
        sensitive_prefixes: Vec<String>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            policy,
            forwarder,
            audit,
            sensitive_prefixes,
            metrics,
        }
    }

    /// Run one authenticated request through authorize → forward → filter.
    ///
    /// Returns the upstream's status with a disclosure-filtered body.
    /// Disclosure anomalies degrade to pass-through (the filter is total);
    /// authorization and upstream failures are terminal for the request.
    pub async fn handle(
        &self,
        identity: &CallerIdentity,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ProxyResponse, GatewayError> {
        self.metrics.increment_received();

        if let Err(e) = self.policy.authorize(identity.role, path) {
            self.metrics.increment_forbidden();
            warn!(
                subject = %identity.subject_id,
                role = %identity.role,
                path,
                "request rejected by policy"
            );
            return Err(e);
        }

        let upstream = match self
            .forwarder
            .forward(method, path, query, headers, body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.metrics.increment_upstream_errors();
                warn!(path, error = %e, "upstream request failed");
                return Err(e);
            }
        };
        self.metrics.increment_forwarded();

        // Nothing to parse or disclose in an empty body.
        if upstream.body.is_empty() {
            return Ok(ProxyResponse {
                status: upstream.status,
                content_type: upstream.content_type,
                body: upstream.body,
            });
        }

        let mut value: serde_json::Value =
            serde_json::from_slice(&upstream.body).map_err(|e| {
                self.metrics.increment_upstream_errors();
                GatewayError::UpstreamPayload(e.to_string())
            })?;

        let stats = disclosure::apply(&mut value, identity.role);
        self.metrics.record_filter(&stats);
        debug!(
            subject = %identity.subject_id,
            role = %identity.role,
            path,
            hidden = stats.hidden,
            coarsened = stats.coarsened,
            contacts_stripped = stats.contacts_stripped,
            unclassified = stats.unclassified,
            "disclosure filter applied"
        );

        let body = serde_json::to_vec(&value)
            .map_err(|e| GatewayError::UpstreamPayload(e.to_string()))?;

        Ok(ProxyResponse {
            status: upstream.status,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: Bytes::from(body),
        })
    }

    /// Dispatch an audit entry for a completed response, detached from the
    /// response path.
    ///
    /// Only critical actions are recorded. The spawned task owns the entry;
    /// sink errors are logged and dropped, never retried, never surfaced.
    pub fn dispatch_audit(
        &self,
        identity: &CallerIdentity,
        method: &Method,
        path: &str,
        result_status: StatusCode,
    ) {
        if !audit_helpers::is_critical(method, path, &self.sensitive_prefixes) {
            return;
        }
        let Some(sink) = self.audit.as_ref() else {
            return;
        };

        let entry = AuditEntry::new(
            identity.subject_id.clone(),
            identity.role,
            method.as_str(),
            path,
            result_status.as_u16(),
        );

        self.metrics.increment_audit_dispatched();
        let sink = Arc::clone(sink);
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move {
            if let Err(e) = sink.record(entry).await {
                metrics.increment_audit_dropped();
                warn!(error = %e, "audit entry dropped");
            }
        });
    }

    /// Borrow the metrics counters.
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Clone the shared metrics handle.
    pub fn metrics_arc(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Json;
    use axum::routing::{any, get};

    use iyashi_audit_memory::MemoryAuditSink;
    use iyashi_core::Role;

    use crate::builder::GatewayBuilder;

    use super::*;

    async fn spawn_upstream() -> String {
        let app = axum::Router::new()
            .route(
                "/api/bookings",
                get(|| async {
                    Json(serde_json::json!({
                        "id": "bk-1",
                        "status": "BOOKED",
                        "location": "東京都渋谷区神宮前6-23-4",
                    }))
                }),
            )
            .route("/api/plain", any(|| async { "not json" }))
            .route("/api/empty", any(|| async { axum::http::StatusCode::NO_CONTENT }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_identity() -> CallerIdentity {
        CallerIdentity::new("user-1", Role::Client)
    }

    #[tokio::test]
    async fn forbidden_requests_never_reach_the_upstream() {
        // Unroutable upstream: a forward attempt would error, not 403.
        let gateway = GatewayBuilder::new()
            .upstream("http://127.0.0.1:1")
            .build()
            .unwrap();

        let err = gateway
            .handle(
                &client_identity(),
                Method::GET,
                "/api/admin/users",
                None,
                &HeaderMap::new(),
                Bytes::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden { .. }));
        assert_eq!(gateway.metrics().snapshot().forbidden, 1);
        assert_eq!(gateway.metrics().snapshot().forwarded, 0);
    }

    #[tokio::test]
    async fn filtered_body_carries_the_upstream_status() {
        let base = spawn_upstream().await;
        let gateway = GatewayBuilder::new().upstream(&base).build().unwrap();

        let response = gateway
            .handle(
                &client_identity(),
                Method::GET,
                "/api/bookings",
                None,
                &HeaderMap::new(),
                Bytes::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["location"], "東京都渋谷区（以降、施術開始前に公開）");
        assert_eq!(gateway.metrics().snapshot().locations_coarsened, 1);
    }

    #[tokio::test]
    async fn non_json_upstream_body_is_an_upstream_payload_error() {
        let base = spawn_upstream().await;
        let gateway = GatewayBuilder::new().upstream(&base).build().unwrap();

        let err = gateway
            .handle(
                &client_identity(),
                Method::GET,
                "/api/plain",
                None,
                &HeaderMap::new(),
                Bytes::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamPayload(_)));
    }

    #[tokio::test]
    async fn empty_upstream_body_passes_through() {
        let base = spawn_upstream().await;
        let gateway = GatewayBuilder::new().upstream(&base).build().unwrap();

        let response = gateway
            .handle(
                &client_identity(),
                Method::DELETE,
                "/api/empty",
                None,
                &HeaderMap::new(),
                Bytes::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn critical_actions_reach_the_audit_sink() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gateway = GatewayBuilder::new()
            .upstream("http://127.0.0.1:1")
            .audit(Arc::clone(&sink) as Arc<dyn AuditSink>)
            .build()
            .unwrap();

        gateway.dispatch_audit(
            &client_identity(),
            &Method::DELETE,
            "/api/bookings/123",
            StatusCode::OK,
        );

        // The dispatch is detached; poll briefly for the entry.
        for _ in 0..50 {
            if !sink.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "DELETE /api/bookings/123");
        assert_eq!(entries[0].resource_id.as_deref(), Some("123"));
        assert_eq!(entries[0].result_status, 200);
    }

    #[tokio::test]
    async fn plain_reads_are_not_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gateway = GatewayBuilder::new()
            .upstream("http://127.0.0.1:1")
            .audit(Arc::clone(&sink) as Arc<dyn AuditSink>)
            .build()
            .unwrap();

        gateway.dispatch_audit(
            &client_identity(),
            &Method::GET,
            "/api/bookings",
            StatusCode::OK,
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sink.is_empty());
        assert_eq!(gateway.metrics().snapshot().audit_dispatched, 0);
    }
}
