//! Token validation contract.
//!
//! A [`TokenValidator`] checks a bearer token against a trust authority
//! using a [`ValidationOptions`] value assembled per request by the
//! middleware. Failures carry a distinct [`ValidationError`] so they can be
//! logged and tested, even though callers only ever see one `unauthorized`
//! response.

use std::collections::BTreeSet;
use thiserror::Error;

/// Checks to perform for a single validation call.
///
/// Built fresh for each request and never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Verify the token signature against the authority's keys.
    pub verify_signature: bool,
    /// Reject tokens whose `exp` claim is in the past.
    pub verify_exp: bool,
    /// Require the `aud` claim to contain [`audience`](Self::audience).
    pub verify_aud: bool,
    /// Require the `iss` claim to equal [`issuer`](Self::issuer).
    pub verify_iss: bool,
    /// Expected issuer.
    pub issuer: Option<String>,
    /// Expected audience.
    pub audience: Option<String>,
    /// Scopes the token must carry. Empty means basic validity is enough.
    pub required_scopes: BTreeSet<String>,
}

impl ValidationOptions {
    /// Options that verify signature and expiry, plus issuer and audience
    /// whenever they are given.
    pub fn new(issuer: Option<String>, audience: Option<String>) -> Self {
        Self {
            verify_signature: true,
            verify_exp: true,
            verify_aud: audience.is_some(),
            verify_iss: issuer.is_some(),
            issuer,
            audience,
            required_scopes: BTreeSet::new(),
        }
    }

    /// Return these options with `scopes` added to the required set.
    pub fn with_required_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Required scopes that `granted` does not cover, in sorted order.
    pub fn missing_scopes<'a, I>(&self, granted: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let granted: BTreeSet<&str> = granted.into_iter().collect();
        self.required_scopes
            .iter()
            .filter(|scope| !granted.contains(scope.as_str()))
            .cloned()
            .collect()
    }
}

/// Why a token was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The signature does not verify against the authority's keys.
    #[error("invalid_signature")]
    InvalidSignature,
    /// The token's validity window has elapsed.
    #[error("expired")]
    Expired,
    /// The `aud` claim does not name this resource.
    #[error("audience_mismatch")]
    AudienceMismatch,
    /// The `iss` claim is not the trusted authority.
    #[error("issuer_mismatch")]
    IssuerMismatch,
    /// The token lacks one or more required scopes.
    #[error("insufficient_scope: missing {}", missing.join(" "))]
    InsufficientScope { missing: Vec<String> },
    /// The token could not be decoded.
    #[error("malformed token: {0}")]
    Malformed(String),
    /// No signing key matches the token's key id.
    #[error("unknown signing key: {0}")]
    UnknownKey(String),
    /// The trust authority could not be reached.
    #[error("authority unavailable: {0}")]
    Unavailable(String),
    /// Validation did not finish within the configured bound.
    #[error("validation timed out")]
    TimedOut,
}

/// Trait for validating a bearer token against a trust authority.
///
/// Implementations must not cache tokens: every call performs a fresh
/// check. Failing to reach the authority is a validation failure, not a
/// fatal error.
///
/// ```rust,ignore
/// use rmcp_auth::auth::{TokenValidator, ValidationError, ValidationOptions};
///
/// #[derive(Clone)]
/// struct Static;
///
/// impl TokenValidator for Static {
///     type Claims = String;
///
///     async fn validate(
///         &self,
///         token: &str,
///         _options: &ValidationOptions,
///     ) -> Result<String, ValidationError> {
///         if token == "secret" {
///             Ok("ok".into())
///         } else {
///             Err(ValidationError::InvalidSignature)
///         }
///     }
/// }
/// ```
pub trait TokenValidator: Clone + Send + Sync + 'static {
    /// The claims type produced on successful validation.
    type Claims: Clone + Send + Sync + 'static;

    /// Validate `token` with the given options.
    fn validate(
        &self,
        token: &str,
        options: &ValidationOptions,
    ) -> impl Future<Output = Result<Self::Claims, ValidationError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::ValidationOptions;

    #[test]
    fn new_enables_checks_for_given_values() {
        let opts = ValidationOptions::new(Some("https://auth.example.com".into()), None);
        assert!(opts.verify_signature);
        assert!(opts.verify_exp);
        assert!(opts.verify_iss);
        assert!(!opts.verify_aud);
        assert!(opts.required_scopes.is_empty());
    }

    #[test]
    fn missing_scopes_reports_uncovered() {
        let opts = ValidationOptions::new(None, None)
            .with_required_scopes(["search:read", "user:write"]);
        assert_eq!(
            opts.missing_scopes(["search:read", "user:read"]),
            vec!["user:write".to_string()]
        );
        assert!(opts.missing_scopes(["user:write", "search:read"]).is_empty());
    }
}
