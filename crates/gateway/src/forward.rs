use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::error::GatewayError;

/// Headers that must not be relayed between hops (RFC 9110 §7.6.1), plus
/// `host` and `content-length`, which the client recomputes.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Raw upstream reply: status, content type, and unparsed body bytes.
#[derive(Debug)]
pub struct UpstreamResponse {
    /// Status code returned by the upstream API.
    pub status: StatusCode,
    /// The upstream's `Content-Type`, if any.
    pub content_type: Option<HeaderValue>,
    /// The buffered response body.
    pub body: Bytes,
}

/// Relays verified requests to the upstream domain API unchanged.
///
/// No retries: idempotency of upstream operations is unknown to the
/// gateway, so retrying is the caller's decision.
pub struct UpstreamForwarder {
    client: Client,
    base_url: String,
}

impl UpstreamForwarder {
    /// Create a forwarder for the given base URL and request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a forwarder with a caller-supplied client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Forward one request and buffer the upstream's reply.
    ///
    /// The upstream URL is the configured base plus the original path and
    /// query string; method, headers (minus hop-by-hop), and body are
    /// relayed verbatim. Dropping the returned future cancels the
    /// in-flight upstream call.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, GatewayError> {
        let mut url = format!("{}{path}", self.base_url);
        if let Some(q) = query {
            url.push('?');
            url.push_str(q);
        }

        let mut outbound = HeaderMap::new();
        for (name, value) in headers {
            if !is_hop_by_hop(name) {
                outbound.append(name.clone(), value.clone());
            }
        }

        debug!(method = %method, url = %url, "forwarding to upstream");

        let response = self
            .client
            .request(method, &url)
            .headers(outbound)
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}
