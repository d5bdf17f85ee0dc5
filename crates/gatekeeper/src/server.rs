//! Router assembly and the serve loop.

use crate::{config::Config, tools::ToolServer};
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp_auth::auth::{
    AuthLayer, TokenValidator,
    jwt::JwtValidator,
    oauth::{ProtectedResourceMetadata, metadata_router},
};

/// Mount point of the MCP endpoint.
pub const MCP_PATH: &str = "/mcp";

/// Unauthenticated liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// The MCP tool endpoint, in stateless mode.
pub fn mcp_router() -> Router {
    let mut config = StreamableHttpServerConfig::default();
    config.stateful_mode = false;

    let service = StreamableHttpService::new(
        || Ok(ToolServer::new()),
        LocalSessionManager::default().into(),
        config,
    );
    Router::new().nest_service(MCP_PATH, service)
}

/// Put `mcp`, the discovery document and the health probe behind `auth`.
pub fn router<V: TokenValidator>(
    mcp: Router,
    metadata: ProtectedResourceMetadata,
    auth: AuthLayer<V>,
) -> Router {
    mcp.route(HEALTH_PATH, get(health))
        .merge(metadata_router(metadata))
        .layer(auth.public_path(HEALTH_PATH))
}

async fn health() -> &'static str {
    "ok"
}

/// Build everything from `config` and serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let metadata = config.metadata()?;
    let resource_server = config.resource_server(&metadata)?;
    let timeout = config.validation_timeout()?;

    let validator = JwtValidator::from_jwks_url(config.jwks_url())
        .timeout(timeout)
        .build()?;
    let auth = AuthLayer::new(validator, resource_server)
        .timeout(timeout)
        .max_body_bytes(config.max_body_bytes);

    let app = router(mcp_router(), metadata, auth);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        addr = %config.bind,
        issuer = %config.issuer,
        jwks = %config.jwks_url(),
        "gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
