use thiserror::Error;

use iyashi_core::Role;

/// Errors that can occur while running a request through the gateway pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The caller's role is not in the allowed set for the matched path prefix.
    #[error("forbidden: role '{role}' may not access {path}")]
    Forbidden {
        /// The caller's role.
        role: Role,
        /// The requested path.
        path: String,
    },

    /// The upstream API could not be reached or failed mid-response.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// The upstream API returned a body that is not valid JSON.
    #[error("upstream returned an unreadable body: {0}")]
    UpstreamPayload(String),

    /// The gateway was misconfigured (e.g. missing upstream base URL).
    #[error("configuration error: {0}")]
    Configuration(String),
}
