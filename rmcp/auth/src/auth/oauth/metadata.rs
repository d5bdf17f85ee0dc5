//! OAuth 2.0 Protected Resource Metadata (RFC 9728).
//!
//! MCP servers MUST implement RFC 9728 to indicate the locations of their
//! authorization servers. This module provides the metadata type and an axum
//! router that serves it at the well-known endpoint.
//!
//! ```rust,ignore
//! use rmcp_auth::auth::oauth::{ProtectedResourceMetadata, metadata_router};
//!
//! let metadata = ProtectedResourceMetadata::new("https://mcp.example.com/mcp")
//!     .authorization_server("https://auth.example.com")
//!     .scope("search:read");
//!
//! let app = axum::Router::new()
//!     .nest_service("/mcp", mcp_service)
//!     .merge(metadata_router(metadata));
//! ```

use axum::{Json, response::IntoResponse};
use http::Uri;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Root of the discovery endpoint. Every path under it is public.
pub const WELL_KNOWN_PATH: &str = "/.well-known/oauth-protected-resource";

/// Problems that make a metadata document unusable.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("resource identifier is empty")]
    EmptyResource,
    #[error("no authorization servers configured")]
    NoAuthorizationServers,
    #[error("resource is not an absolute URL: {0}")]
    InvalidResource(String),
}

/// OAuth 2.0 Protected Resource Metadata ([RFC 9728](https://datatracker.ietf.org/doc/html/rfc9728)).
///
/// MCP servers MUST include the `authorization_servers` field containing at
/// least one authorization server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Authorization server(s) that can issue tokens for this resource,
    /// in order of preference.
    pub authorization_servers: Vec<String>,

    /// Bearer token methods supported. Always `["header"]` here.
    pub bearer_methods_supported: Vec<String>,

    /// The resource identifier, canonical URI of this MCP server.
    pub resource: String,

    /// URL of the resource documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_documentation: Option<String>,

    /// Scopes supported by this resource.
    pub scopes_supported: Vec<String>,
}

impl ProtectedResourceMetadata {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            authorization_servers: Vec::new(),
            bearer_methods_supported: vec!["header".into()],
            resource: resource.into(),
            resource_documentation: None,
            scopes_supported: Vec::new(),
        }
    }

    /// Append an authorization server.
    pub fn authorization_server(mut self, url: impl Into<String>) -> Self {
        self.authorization_servers.push(url.into());
        self
    }

    /// Set the documentation link.
    pub fn documentation(mut self, url: impl Into<String>) -> Self {
        self.resource_documentation = Some(url.into());
        self
    }

    /// Advertise a supported scope. Duplicates are ignored.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !self.scopes_supported.contains(&scope) {
            self.scopes_supported.push(scope);
        }
        self
    }

    /// Check the document is complete enough to serve.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.resource.trim().is_empty() {
            return Err(MetadataError::EmptyResource);
        }
        if self.authorization_servers.is_empty() {
            return Err(MetadataError::NoAuthorizationServers);
        }
        self.resource_uri().map(|_| ())
    }

    /// Path at which this document is served, with the resource path
    /// appended per RFC 9728 §3.1 (e.g. `/.well-known/oauth-protected-resource/mcp`).
    pub fn metadata_path(&self) -> Result<String, MetadataError> {
        let uri = self.resource_uri()?;
        let path = uri.path().trim_end_matches('/');
        Ok(format!("{WELL_KNOWN_PATH}{path}"))
    }

    /// Absolute URL of this document, for `resource_metadata` challenges.
    pub fn metadata_url(&self) -> Result<String, MetadataError> {
        let uri = self.resource_uri()?;
        let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) else {
            return Err(MetadataError::InvalidResource(self.resource.clone()));
        };
        Ok(format!("{scheme}://{authority}{}", self.metadata_path()?))
    }

    fn resource_uri(&self) -> Result<Uri, MetadataError> {
        let uri: Uri = self
            .resource
            .parse()
            .map_err(|_| MetadataError::InvalidResource(self.resource.clone()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(MetadataError::InvalidResource(self.resource.clone()));
        }
        Ok(uri)
    }
}

/// Create an axum [`Router`](axum::Router) that serves the Protected Resource
/// Metadata at `/.well-known/oauth-protected-resource`, and also at the
/// path-suffixed location when the resource has a path.
///
/// The endpoint takes no input and always answers `200` with the same
/// document.
///
/// ```rust,ignore
/// let app = axum::Router::new()
///     .nest_service("/mcp", mcp_service)
///     .merge(metadata_router(metadata));
/// ```
pub fn metadata_router(metadata: ProtectedResourceMetadata) -> axum::Router {
    let suffixed = metadata
        .metadata_path()
        .ok()
        .filter(|path| path != WELL_KNOWN_PATH);
    let metadata = Arc::new(metadata);
    let handler = axum::routing::get(move || {
        let metadata = metadata.clone();
        async move { Json(metadata.as_ref().clone()).into_response() }
    });

    let router = axum::Router::new().route(WELL_KNOWN_PATH, handler.clone());
    match suffixed {
        Some(path) => router.route(&path, handler),
        None => router,
    }
}

#[cfg(test)]
mod tests {
    use super::{MetadataError, ProtectedResourceMetadata, WELL_KNOWN_PATH, metadata_router};
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    fn metadata() -> ProtectedResourceMetadata {
        ProtectedResourceMetadata::new("https://mcp.example.com/mcp")
            .authorization_server("https://auth.example.com/resources/res_1")
            .documentation("https://mcp.example.com/mcp/docs")
            .scope("search:read")
            .scope("search:read")
    }

    #[test]
    fn serializes_rfc9728_fields() {
        let value = serde_json::to_value(metadata()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "authorization_servers": ["https://auth.example.com/resources/res_1"],
                "bearer_methods_supported": ["header"],
                "resource": "https://mcp.example.com/mcp",
                "resource_documentation": "https://mcp.example.com/mcp/docs",
                "scopes_supported": ["search:read"],
            })
        );
    }

    #[test]
    fn metadata_url_inserts_well_known_before_path() {
        assert_eq!(
            metadata().metadata_url().unwrap(),
            "https://mcp.example.com/.well-known/oauth-protected-resource/mcp"
        );
        let root = ProtectedResourceMetadata::new("https://mcp.example.com/");
        assert_eq!(
            root.metadata_url().unwrap(),
            "https://mcp.example.com/.well-known/oauth-protected-resource"
        );
    }

    #[test]
    fn validate_rejects_incomplete_documents() {
        assert!(metadata().validate().is_ok());
        assert!(matches!(
            ProtectedResourceMetadata::new("https://mcp.example.com").validate(),
            Err(MetadataError::NoAuthorizationServers)
        ));
        assert!(matches!(
            ProtectedResourceMetadata::new("")
                .authorization_server("https://auth.example.com")
                .validate(),
            Err(MetadataError::EmptyResource)
        ));
        assert!(matches!(
            ProtectedResourceMetadata::new("/mcp")
                .authorization_server("https://auth.example.com")
                .validate(),
            Err(MetadataError::InvalidResource(_))
        ));
    }

    #[test]
    fn served_paths_stay_under_the_public_prefix() {
        assert!(metadata().metadata_path().unwrap().starts_with(WELL_KNOWN_PATH));
    }

    #[tokio::test]
    async fn serves_both_locations() {
        for uri in [WELL_KNOWN_PATH, "/.well-known/oauth-protected-resource/mcp"] {
            let resp = metadata_router(metadata())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);

            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let served: ProtectedResourceMetadata = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(served, metadata());
        }
    }
}
