//! OAuth 2.1 error responses for MCP resource servers.
//!
//! Builds the `401 Unauthorized` response and its `WWW-Authenticate`
//! challenge per [RFC 6750 §3](https://datatracker.ietf.org/doc/html/rfc6750#section-3),
//! pointing clients at the Protected Resource Metadata document
//! ([RFC 9728 §5.1](https://datatracker.ietf.org/doc/html/rfc9728#name-www-authenticate-response)).

use crate::auth::{AuthError, RequestKind, ValidationOptions};
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::{HeaderValue, StatusCode, header::InvalidHeaderValue};
use serde::Serialize;
use std::collections::BTreeSet;

/// Realm advertised in every challenge.
pub const REALM: &str = "OAuth";

/// Configuration for an MCP server acting as an OAuth 2.1 resource server.
///
/// Built once at startup and shared read-only by every request.
#[derive(Clone, Debug)]
pub struct ResourceServerConfig {
    /// URL to the Protected Resource Metadata document (RFC 9728).
    ///
    /// Included as `resource_metadata="..."` in `WWW-Authenticate` headers.
    pub resource_metadata_url: String,
    /// Trusted token issuer. Issuer checks are skipped when unset.
    pub issuer: Option<String>,
    /// Audience tokens must be minted for. Audience checks are skipped
    /// when unset.
    pub audience: Option<String>,
    /// Scopes required on top of basic validity for `tools/call` requests.
    pub tool_scopes: BTreeSet<String>,
}

impl ResourceServerConfig {
    pub fn new(resource_metadata_url: impl Into<String>) -> Self {
        Self {
            resource_metadata_url: resource_metadata_url.into(),
            issuer: None,
            audience: None,
            tool_scopes: BTreeSet::new(),
        }
    }

    /// Require the `iss` claim to match this value.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require the `aud` claim to contain this value.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Add a scope that tool invocations must carry.
    pub fn tool_scope(mut self, scope: impl Into<String>) -> Self {
        self.tool_scopes.insert(scope.into());
        self
    }

    /// Assemble the options for validating a request of the given kind.
    pub fn validation_options(&self, kind: RequestKind) -> ValidationOptions {
        let options = ValidationOptions::new(self.issuer.clone(), self.audience.clone());
        match kind {
            RequestKind::ToolCall => options.with_required_scopes(self.tool_scopes.iter().cloned()),
            RequestKind::Discovery | RequestKind::Plain => options,
        }
    }

    /// The `WWW-Authenticate` challenge for this resource server.
    ///
    /// Fails when the metadata URL cannot appear in a header value.
    pub fn challenge(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!(
            "Bearer realm=\"{REALM}\", resource_metadata=\"{}\"",
            self.resource_metadata_url,
        ))
    }
}

/// Build a `WWW-Authenticate` header value for a 401 Unauthorized response.
///
/// Format: `Bearer realm="OAuth", resource_metadata="<url>"`. Falls back to
/// a bare realm challenge if the configured URL is not header-safe.
pub fn www_authenticate_401(config: &ResourceServerConfig) -> HeaderValue {
    config
        .challenge()
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer realm=\"OAuth\""))
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    error_description: &'static str,
}

/// Build the 401 response for an authorization failure.
///
/// Every [`AuthError`] maps to the same `unauthorized` code; only the
/// description differs.
pub fn unauthorized_response(config: &ResourceServerConfig, err: &AuthError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(http::header::WWW_AUTHENTICATE, www_authenticate_401(config))],
        Json(ErrorBody {
            error: "unauthorized",
            error_description: err.description(),
        }),
    )
        .into_response()
}

/// Build the 400 response for a protected request whose body could not be
/// read.
pub fn invalid_request_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: "invalid_request",
            error_description: "Request body could not be read",
        }),
    )
        .into_response()
}
