//! # rmcp-auth
//!
//! Bearer-token authorization for MCP servers built with
//! [rmcp](https://docs.rs/rmcp) and [axum](https://docs.rs/axum).
//!
//! ## Auth Middleware
//!
//! Provides a [`TokenValidator`](auth::TokenValidator) trait and a tower
//! middleware that guards every request except the OAuth discovery
//! endpoints. Tool invocations (`tools/call`) require an elevated scope.
//!
//! ```rust,ignore
//! use rmcp_auth::auth::{AuthLayer, jwt::JwtValidator};
//! use rmcp_auth::auth::oauth::{ProtectedResourceMetadata, ResourceServerConfig, metadata_router};
//!
//! let validator = JwtValidator::from_jwks_url("https://auth.example.com/keys").build()?;
//! let config = ResourceServerConfig::new(metadata.metadata_url()?)
//!     .issuer("https://auth.example.com")
//!     .tool_scope("search:read");
//!
//! let app = axum::Router::new()
//!     .nest_service("/mcp", service)
//!     .merge(metadata_router(metadata))
//!     .layer(AuthLayer::new(validator, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8002").await?;
//! axum::serve(listener, app).await?;
//! ```

pub use axum;

pub mod auth;
