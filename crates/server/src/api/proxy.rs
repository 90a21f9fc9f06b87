use axum::Extension;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;

use iyashi_core::CallerIdentity;

use crate::error::ServerError;

use super::AppState;

/// Upper bound on buffered request bodies. The body must be read exactly
/// once to forward it, so it is buffered rather than streamed.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Catch-all proxy handler: the authenticated request pipeline.
///
/// The auth middleware has already produced the [`CallerIdentity`]; this
/// handler runs authorize → forward → filter via the gateway, responds
/// with the upstream's status and the filtered body, and then triggers
/// the detached audit dispatch. The audit task is handed off after the
/// response value is built; its outcome cannot affect the caller.
pub async fn forward(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    req: Request,
) -> Result<Response, ServerError> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();
    let query = parts.uri.query().map(str::to_owned);

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

    let proxied = state
        .gateway
        .handle(
            &identity,
            parts.method.clone(),
            &path,
            query.as_deref(),
            &parts.headers,
            body,
        )
        .await?;

    let status = proxied.status;
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = proxied.content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    let response = builder
        .body(Body::from(proxied.body))
        .map_err(|e| ServerError::Config(e.to_string()))?;

    state
        .gateway
        .dispatch_audit(&identity, &parts.method, &path, status);

    Ok(response)
}
