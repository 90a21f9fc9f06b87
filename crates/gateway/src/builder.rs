use std::sync::Arc;
use std::time::Duration;

use iyashi_audit::AuditSink;

use crate::audit_helpers::DEFAULT_SENSITIVE_PREFIXES;
use crate::error::GatewayError;
use crate::forward::UpstreamForwarder;
use crate::gateway::Gateway;
use crate::metrics::GatewayMetrics;
use crate::policy::PolicyTable;

/// Default timeout for upstream requests.
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Fluent builder for constructing a [`Gateway`] instance.
///
/// At minimum, an upstream base URL must be supplied. All other fields
/// have sensible defaults (platform policy table, default sensitive
/// prefixes, no audit sink).
pub struct GatewayBuilder {
    policy: Option<PolicyTable>,
    upstream_base_url: Option<String>,
    upstream_timeout: Duration,
    audit: Option<Arc<dyn AuditSink>>,
    sensitive_prefixes: Vec<String>,
}

impl GatewayBuilder {
    /// Create a new builder with all optional fields set to their defaults.
    pub fn new() -> Self {
        Self {
            policy: None,
            upstream_base_url: None,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            audit: None,
            sensitive_prefixes: DEFAULT_SENSITIVE_PREFIXES
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
        }
    }

    /// Set the access policy table.
    #[must_use]
    pub fn policy(mut self, table: PolicyTable) -> Self {
        self.policy = Some(table);
        self
    }

    /// Set the upstream API base URL.
    #[must_use]
    pub fn upstream(mut self, base_url: impl Into<String>) -> Self {
        self.upstream_base_url = Some(base_url.into());
        self
    }

    /// Set the per-request upstream timeout.
    #[must_use]
    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Set the audit sink for critical actions.
    #[must_use]
    pub fn audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Replace the sensitive path prefixes audited regardless of method.
    #[must_use]
    pub fn sensitive_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.sensitive_prefixes = prefixes;
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let base_url = self.upstream_base_url.ok_or_else(|| {
            GatewayError::Configuration("upstream base URL is required".to_owned())
        })?;
        let forwarder = UpstreamForwarder::new(base_url, self.upstream_timeout)?;

        Ok(Gateway::new(
            self.policy.unwrap_or_else(PolicyTable::platform_defaults),
            forwarder,
            self.audit,
            self.sensitive_prefixes,
            Arc::new(GatewayMetrics::default()),
        ))
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_an_upstream() {
        let err = GatewayBuilder::new().build().unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn build_with_upstream_succeeds() {
        let gateway = GatewayBuilder::new()
            .upstream("http://127.0.0.1:9000")
            .build()
            .unwrap();
        assert_eq!(gateway.metrics().snapshot().received, 0);
    }
}
