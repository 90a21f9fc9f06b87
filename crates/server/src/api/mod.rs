pub mod health;
pub mod proxy;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use iyashi_gateway::Gateway;

use crate::auth::TokenVerifier;
use crate::auth::middleware::AuthLayer;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The request pipeline. Immutable after build.
    pub gateway: Arc<Gateway>,
    /// The credential verifier backing the auth middleware.
    pub verifier: Arc<TokenVerifier>,
}

/// Build the axum router: public health endpoints plus the authenticated
/// catch-all proxy, with trace and permissive CORS layers on everything.
///
/// CORS preflights are answered by the CORS layer before authentication,
/// so an `OPTIONS` preflight never needs a token.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics));

    let proxied = Router::new()
        .route("/", any(proxy::forward))
        .route("/{*path}", any(proxy::forward))
        .layer(AuthLayer::new(Arc::clone(&state.verifier)));

    Router::new()
        .merge(public)
        .merge(proxied)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
