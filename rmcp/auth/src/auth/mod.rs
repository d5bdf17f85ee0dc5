//! Authorization middleware for MCP servers.
//!
//! Provides a tower middleware that guards every request with a bearer
//! token checked by a user-supplied [`TokenValidator`]. Requests under the
//! OAuth discovery prefix (and any extra public paths) pass through
//! untouched. For everything else the middleware:
//!
//! 1. extracts `Authorization: Bearer <token>`,
//! 2. buffers the body and classifies it ([`classify_body`]),
//! 3. assembles [`ValidationOptions`], adding the tool scopes for
//!    `tools/call` requests,
//! 4. runs the validator under a timeout,
//! 5. forwards the request with the claims in its extensions, or answers
//!    `401` with a `WWW-Authenticate` challenge.
//!
//! # Example
//!
//! ```rust,ignore
//! use rmcp_auth::auth::AuthLayer;
//! use rmcp_auth::auth::oauth::ResourceServerConfig;
//!
//! let rs_config = ResourceServerConfig::new(
//!     "https://mcp.example.com/.well-known/oauth-protected-resource/mcp",
//! )
//! .tool_scope("search:read");
//!
//! let app = axum::Router::new()
//!     .nest_service("/mcp", service)
//!     .layer(AuthLayer::new(MyValidator, rs_config).public_path("/health"));
//! ```

mod bearer;
mod classify;
mod validate;

pub mod oauth;

#[cfg(feature = "jwt")]
pub mod jwt;

pub use bearer::{BEARER_PREFIX, bearer_token, token_prefix};
pub use classify::{RequestKind, TOOL_CALL_METHOD, classify_body};
pub use validate::{TokenValidator, ValidationError, ValidationOptions};

use axum::body::Body;
use futures::future::BoxFuture;
use http::{Request, Response};
use oauth::{
    ResourceServerConfig, WELL_KNOWN_PATH, invalid_request_response, unauthorized_response,
};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;

/// Default bound on a single validator call.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Why a request was denied.
///
/// All variants surface to the caller as the same `401 unauthorized`
/// response; the distinction is kept for logs and tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or one without the `Bearer ` scheme.
    #[error("missing_or_invalid_header")]
    MissingHeader,
    /// The header carries the scheme but no token.
    #[error("empty_token")]
    EmptyToken,
    /// The validator rejected the token, errored, or timed out.
    #[error("token_validation_failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

impl AuthError {
    /// Human-readable description sent as `error_description`.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "Missing or invalid authorization header",
            AuthError::EmptyToken => "Empty bearer token",
            AuthError::ValidationFailed(_) => "Token validation failed",
        }
    }
}

#[derive(Clone)]
struct Settings {
    config: ResourceServerConfig,
    public_paths: Vec<String>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl Settings {
    fn is_public(&self, path: &str) -> bool {
        under(path, WELL_KNOWN_PATH) || self.public_paths.iter().any(|p| under(path, p))
    }
}

/// `path` equals `prefix` or continues it with a new segment.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Tower [`Layer`](tower::Layer) that applies [`AuthService`].
#[derive(Clone)]
pub struct AuthLayer<V> {
    validator: V,
    settings: Arc<Settings>,
}

impl<V> AuthLayer<V> {
    pub fn new(validator: V, config: ResourceServerConfig) -> Self {
        Self {
            validator,
            settings: Arc::new(Settings {
                config,
                public_paths: Vec::new(),
                timeout: DEFAULT_VALIDATION_TIMEOUT,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            }),
        }
    }

    /// Add a path that does not require authorization.
    ///
    /// `/.well-known/oauth-protected-resource` and everything beneath it is
    /// always public.
    pub fn public_path(mut self, path: impl Into<String>) -> Self {
        self.settings_mut().public_paths.push(path.into());
        self
    }

    /// Bound each validator call. Calls that overrun are rejected.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings_mut().timeout = timeout;
        self
    }

    /// Cap the request body buffered for classification.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.settings_mut().max_body_bytes = limit;
        self
    }

    fn settings_mut(&mut self) -> &mut Settings {
        Arc::make_mut(&mut self.settings)
    }
}

impl<V, S> tower::Layer<S> for AuthLayer<V>
where
    V: Clone,
{
    type Service = AuthService<V, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            validator: self.validator.clone(),
            settings: self.settings.clone(),
            inner,
        }
    }
}

/// Tower service that authorizes requests before forwarding them.
#[derive(Clone)]
pub struct AuthService<V, S> {
    validator: V,
    settings: Arc<Settings>,
    inner: S,
}

impl<V, S> tower::Service<Request<Body>> for AuthService<V, S>
where
    V: TokenValidator,
    S: tower::Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let validator = self.validator.clone();
        let settings = self.settings.clone();
        let mut inner = self.inner.clone();
        // swap to ensure poll_ready state is preserved
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            if settings.is_public(req.uri().path()) {
                tracing::trace!(
                    path = req.uri().path(),
                    kind = ?RequestKind::Discovery,
                    "public path, skipping authorization"
                );
                return inner.call(req).await;
            }

            let (parts, body) = req.into_parts();
            let token = match bearer_token(&parts.headers) {
                Ok(token) => token.to_owned(),
                Err(err) => {
                    tracing::debug!(path = parts.uri.path(), error = %err, "request denied");
                    return Ok(unauthorized_response(&settings.config, &err));
                }
            };

            let bytes = match axum::body::to_bytes(body, settings.max_body_bytes).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::debug!(
                        path = parts.uri.path(),
                        error = %err,
                        "unreadable request body"
                    );
                    return Ok(invalid_request_response());
                }
            };

            let kind = classify_body(&bytes);
            let options = settings.config.validation_options(kind);

            match authorize(&validator, &token, &options, settings.timeout).await {
                Ok(claims) => {
                    tracing::debug!(
                        path = parts.uri.path(),
                        kind = ?kind,
                        token = token_prefix(&token),
                        "request authorized"
                    );
                    let mut req = Request::from_parts(parts, Body::from(bytes));
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(err) => {
                    tracing::warn!(
                        path = parts.uri.path(),
                        kind = ?kind,
                        token = token_prefix(&token),
                        error = %err,
                        "request denied"
                    );
                    Ok(unauthorized_response(&settings.config, &err))
                }
            }
        })
    }
}

/// Run the validator, failing closed when it overruns `timeout`.
async fn authorize<V: TokenValidator>(
    validator: &V,
    token: &str,
    options: &ValidationOptions,
    timeout: Duration,
) -> Result<V::Claims, AuthError> {
    match tokio::time::timeout(timeout, validator.validate(token, options)).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => Err(ValidationError::TimedOut.into()),
    }
}
