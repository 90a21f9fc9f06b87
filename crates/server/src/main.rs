use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use iyashi_audit::AuditSink;
use iyashi_audit_webhook::WebhookAuditSink;
use iyashi_gateway::GatewayBuilder;
use iyashi_server::api::AppState;
use iyashi_server::auth::{KeySetCache, TokenVerifier};
use iyashi_server::config::BffConfig;

/// Iyashi BFF gateway HTTP server.
#[derive(Parser, Debug)]
#[command(
    name = "iyashi-server",
    about = "Backend-for-frontend edge gateway for the Iyashi booking platform"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "iyashi.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if !Path::new(&cli.config).exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }
    let config = BffConfig::load(&cli.config)?;

    // Credential verifier: key set cache plus out-of-band refresh task.
    let jwks_uri = config
        .auth
        .jwks_uri
        .clone()
        .ok_or("auth.jwks_uri (or IYASHI_JWKS_URI) is required")?;
    let issuer = config
        .auth
        .issuer
        .clone()
        .ok_or("auth.issuer (or IYASHI_ISSUER) is required")?;
    let audience = config
        .auth
        .audience
        .clone()
        .ok_or("auth.audience (or IYASHI_AUDIENCE) is required")?;

    let keys = Arc::new(KeySetCache::new(jwks_uri)?);
    let _refresh_handle = Arc::clone(&keys)
        .spawn_refresh_task(Duration::from_secs(config.auth.refresh_interval_seconds));
    let verifier = Arc::new(TokenVerifier::new(
        keys,
        issuer,
        audience,
        config.auth.role_claim.clone(),
    ));
    info!("credential verifier initialized");

    // Audit collector sink.
    let audit_sink: Option<Arc<dyn AuditSink>> = if config.audit.enabled {
        let collector_url = config
            .audit
            .collector_url
            .clone()
            .ok_or("audit.collector_url (or IYASHI_AUDIT_URL) is required when audit is enabled")?;
        let sink = WebhookAuditSink::new(collector_url)?;
        info!("audit collector sink initialized");
        Some(Arc::new(sink))
    } else {
        None
    };

    // Build the gateway.
    let upstream = config
        .upstream
        .base_url
        .clone()
        .ok_or("upstream.base_url (or IYASHI_UPSTREAM_URL) is required")?;

    let mut builder = GatewayBuilder::new()
        .policy(config.policy_table()?)
        .upstream(&upstream)
        .upstream_timeout(Duration::from_secs(config.upstream.timeout_seconds))
        .sensitive_prefixes(config.audit.sensitive_prefixes.clone());
    if let Some(sink) = audit_sink {
        builder = builder.audit(sink);
    }
    let gateway = Arc::new(builder.build()?);
    info!(upstream = %upstream, "gateway initialized");

    let state = AppState { gateway, verifier };
    let app = iyashi_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "iyashi-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM. In-flight audit
    // tasks are best-effort by design; none are awaited at shutdown.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("iyashi-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
