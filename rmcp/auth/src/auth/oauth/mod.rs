//! OAuth 2.1 resource server support for MCP servers.
//!
//! Implements the server-side (resource server) requirements of the
//! [MCP Authorization specification](https://modelcontextprotocol.io/specification/draft/basic/authorization):
//!
//! - **Protected Resource Metadata** ([RFC 9728](https://datatracker.ietf.org/doc/html/rfc9728)):
//!   Serve `/.well-known/oauth-protected-resource` so MCP clients can discover
//!   authorization servers.
//!
//! - **Challenge responses**: 401 responses with a `WWW-Authenticate` header
//!   per [RFC 6750](https://datatracker.ietf.org/doc/html/rfc6750) and a JSON
//!   `error` / `error_description` body.
//!
//! # Example
//!
//! ```rust,ignore
//! use rmcp_auth::auth::AuthLayer;
//! use rmcp_auth::auth::oauth::{
//!     ProtectedResourceMetadata, ResourceServerConfig, metadata_router,
//! };
//!
//! let metadata = ProtectedResourceMetadata::new("https://mcp.example.com/mcp")
//!     .authorization_server("https://auth.example.com")
//!     .scope("search:read");
//!
//! let rs_config = ResourceServerConfig::new(metadata.metadata_url()?)
//!     .tool_scope("search:read");
//!
//! let app = axum::Router::new()
//!     .nest_service("/mcp", mcp_service)
//!     .merge(metadata_router(metadata))
//!     .layer(AuthLayer::new(validator, rs_config));
//! ```

mod error;
mod metadata;

pub use error::{
    REALM, ResourceServerConfig, invalid_request_response, unauthorized_response,
    www_authenticate_401,
};
pub use metadata::{MetadataError, ProtectedResourceMetadata, WELL_KNOWN_PATH, metadata_router};
