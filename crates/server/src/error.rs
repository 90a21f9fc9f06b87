use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use iyashi_gateway::GatewayError;

/// Errors that can occur while running the Iyashi BFF server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication failed (missing, malformed, or invalid token).
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The inbound request body could not be buffered.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    /// A pipeline error surfaced through the proxy route.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, format!("unauthenticated: {msg}"))
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Gateway(e @ GatewayError::Forbidden { .. }) => {
                (StatusCode::FORBIDDEN, e.to_string())
            }
            // Upstream detail stays in the logs; the caller gets a flat
            // message with no internal identifiers.
            Self::Gateway(GatewayError::Upstream(_) | GatewayError::UpstreamPayload(_)) => (
                StatusCode::BAD_GATEWAY,
                "upstream service unavailable".to_owned(),
            ),
            Self::Gateway(e @ GatewayError::Configuration(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("configuration error: {msg}"),
            ),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use iyashi_core::Role;

    use super::*;

    #[test]
    fn forbidden_maps_to_403() {
        let err = ServerError::Gateway(GatewayError::Forbidden {
            role: Role::Client,
            path: "/api/admin/users".to_owned(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn upstream_failures_map_to_502_without_detail() {
        let err = ServerError::Gateway(GatewayError::Upstream(
            "connection refused (127.0.0.1:9000)".to_owned(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unauthenticated_maps_to_401() {
        let err = ServerError::Unauthenticated("invalid token".to_owned());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
