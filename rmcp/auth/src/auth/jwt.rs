//! JWT validation plugin for OAuth authentication.
//!
//! Validates JWT Bearer tokens by verifying signatures against a JWKS
//! endpoint. Implements [`TokenValidator`](super::TokenValidator) producing
//! [`TokenClaims`].
//!
//! The key set is fetched lazily and refreshed once whenever a token names
//! a key id that is not cached (key rotation), at most once per
//! [`DEFAULT_MIN_REFRESH_INTERVAL`] unless configured otherwise. Tokens
//! themselves are never cached.
//!
//! When a key declares its `alg`, only that algorithm is accepted for it.
//!
//! Requires the `jwt` feature.
//!
//! ```rust,ignore
//! use rmcp_auth::auth::{AuthLayer, jwt::JwtValidator};
//!
//! let validator = JwtValidator::from_jwks_url("https://auth.example.com/keys")
//!     .timeout(Duration::from_secs(3))
//!     .build()?;
//!
//! let app = axum::Router::new()
//!     .nest_service("/mcp", service)
//!     .layer(AuthLayer::new(validator, rs_config));
//! ```

use crate::auth::{TokenValidator, ValidationError, ValidationOptions};
use anyhow::{Context, Result};
use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Default minimum spacing between two JWKS fetches.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Claims of a validated access token.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenClaims {
    /// The subject (user/client identifier).
    pub sub: String,
    /// The issuer.
    pub iss: Option<String>,
    /// The audience.
    pub aud: Option<Vec<String>>,
    /// Granted scopes, merged from `scope`, `scp` and `scopes`.
    pub scopes: Vec<String>,
    /// Expiration time (seconds since epoch).
    pub exp: Option<u64>,
}

/// Raw JWT claims deserialized from the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    iss: Option<String>,
    aud: Option<OneOrMany>,
    scope: Option<String>,
    scp: Option<OneOrMany>,
    scopes: Option<Vec<String>>,
    exp: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Single(String),
    Multiple(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::Single(s) => s.split_whitespace().map(String::from).collect(),
            OneOrMany::Multiple(v) => v,
        }
    }
}

impl RawClaims {
    fn into_claims(self) -> TokenClaims {
        let mut scopes: Vec<String> = self
            .scope
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        scopes.extend(self.scp.map(OneOrMany::into_vec).unwrap_or_default());
        scopes.extend(self.scopes.unwrap_or_default());
        scopes.sort();
        scopes.dedup();

        TokenClaims {
            sub: self.sub.unwrap_or_default(),
            iss: self.iss,
            aud: self.aud.map(|aud| match aud {
                OneOrMany::Single(s) => vec![s],
                OneOrMany::Multiple(v) => v,
            }),
            scopes,
            exp: self.exp,
        }
    }
}

/// Builder for [`JwtValidator`].
pub struct JwtValidatorBuilder {
    jwks_url: String,
    timeout: Duration,
    min_refresh_interval: Duration,
}

impl JwtValidatorBuilder {
    /// Bound each JWKS request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum time between two JWKS fetches. Unknown key ids seen sooner
    /// are rejected without contacting the endpoint.
    pub fn min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Build the validator. The key set is fetched on first use.
    pub fn build(self) -> Result<JwtValidator> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build JWKS client")?;

        Ok(JwtValidator {
            inner: Arc::new(JwtValidatorInner {
                jwks: RwLock::new(JwkSet { keys: Vec::new() }),
                source: KeySource::Remote {
                    url: self.jwks_url,
                    client,
                    min_refresh_interval: self.min_refresh_interval,
                },
                last_refresh: Mutex::new(None),
            }),
        })
    }
}

enum KeySource {
    Remote {
        url: String,
        client: reqwest::Client,
        min_refresh_interval: Duration,
    },
    Static,
}

struct JwtValidatorInner {
    jwks: RwLock<JwkSet>,
    source: KeySource,
    /// When the last fetch was attempted. Held across the fetch so
    /// concurrent refreshes collapse into one.
    last_refresh: Mutex<Option<Instant>>,
}

/// JWT validator that verifies tokens against a JWKS endpoint.
#[derive(Clone)]
pub struct JwtValidator {
    inner: Arc<JwtValidatorInner>,
}

impl JwtValidator {
    /// Start building a JWT validator from a JWKS URL.
    pub fn from_jwks_url(url: impl Into<String>) -> JwtValidatorBuilder {
        JwtValidatorBuilder {
            jwks_url: url.into(),
            timeout: Duration::from_secs(5),
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }

    /// A validator over a fixed key set that is never refreshed.
    pub fn from_jwks(jwks: JwkSet) -> Self {
        Self {
            inner: Arc::new(JwtValidatorInner {
                jwks: RwLock::new(jwks),
                source: KeySource::Static,
                last_refresh: Mutex::new(None),
            }),
        }
    }

    /// Refresh the JWKS from the configured endpoint.
    ///
    /// Does nothing if a fetch was attempted within the minimum refresh
    /// interval, successful or not.
    pub async fn refresh_jwks(&self) -> Result<(), ValidationError> {
        let KeySource::Remote {
            url,
            client,
            min_refresh_interval,
        } = &self.inner.source
        else {
            return Ok(());
        };
        let mut last_refresh = self.inner.last_refresh.lock().await;
        if matches!(*last_refresh, Some(at) if at.elapsed() < *min_refresh_interval) {
            tracing::debug!(url = %url, "JWKS fetched recently, not refreshing");
            return Ok(());
        }
        *last_refresh = Some(Instant::now());

        let jwks = fetch_jwks(client, url)
            .await
            .map_err(|e| ValidationError::Unavailable(format!("{e:#}")))?;
        tracing::debug!(url = %url, keys = jwks.keys.len(), "refreshed JWKS");
        *self.inner.jwks.write().await = jwks;
        Ok(())
    }

    fn decode_token(
        &self,
        token: &str,
        options: &ValidationOptions,
        jwks: &JwkSet,
    ) -> Result<TokenClaims, ValidationError> {
        let header = jsonwebtoken::decode_header(token).map_err(map_jwt_error)?;

        let (key, validation) = if options.verify_signature {
            let kid = header
                .kid
                .as_deref()
                .ok_or_else(|| ValidationError::Malformed("JWT missing kid header".into()))?;
            let jwk = jwks
                .find(kid)
                .ok_or_else(|| ValidationError::UnknownKey(kid.to_string()))?;
            let alg = key_algorithm(jwk, header.alg)?;
            let key = DecodingKey::from_jwk(jwk).map_err(|_| ValidationError::InvalidSignature)?;
            (key, validation_for(alg, options))
        } else {
            let mut validation = validation_for(header.alg, options);
            validation.insecure_disable_signature_validation();
            (DecodingKey::from_secret(&[]), validation)
        };

        let data: TokenData<RawClaims> =
            decode(token, &key, &validation).map_err(map_jwt_error)?;
        let claims = data.claims.into_claims();

        let missing = options.missing_scopes(claims.scopes.iter().map(String::as_str));
        if !missing.is_empty() {
            return Err(ValidationError::InsufficientScope { missing });
        }
        Ok(claims)
    }
}

impl TokenValidator for JwtValidator {
    type Claims = TokenClaims;

    async fn validate(
        &self,
        token: &str,
        options: &ValidationOptions,
    ) -> Result<TokenClaims, ValidationError> {
        // Try with current JWKS.
        let jwks = self.inner.jwks.read().await;
        match self.decode_token(token, options, &jwks) {
            Err(ValidationError::UnknownKey(_)) => {}
            other => return other,
        }
        drop(jwks);

        // Unknown key: refresh and retry once.
        self.refresh_jwks().await?;

        let jwks = self.inner.jwks.read().await;
        self.decode_token(token, options, &jwks)
    }
}

/// The algorithm to verify `jwk` with.
///
/// A key that declares its `alg` accepts only tokens signed with it. Keys
/// without one fall back to the token's header, still limited to the key's
/// family by `jsonwebtoken`.
fn key_algorithm(jwk: &Jwk, token_alg: Algorithm) -> Result<Algorithm, ValidationError> {
    let Some(declared) = jwk.common.key_algorithm.as_ref() else {
        return Ok(token_alg);
    };
    match signing_algorithm(declared) {
        Some(alg) if alg == token_alg => Ok(alg),
        _ => {
            tracing::debug!(
                key = ?declared,
                token = ?token_alg,
                "token algorithm does not match key"
            );
            Err(ValidationError::InvalidSignature)
        }
    }
}

fn signing_algorithm(alg: &KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        // encryption algorithms
        _ => None,
    }
}

/// Translate validation options into `jsonwebtoken` settings.
///
/// A configured issuer or audience also makes the claim mandatory;
/// `jsonwebtoken` otherwise skips the check when the claim is absent.
fn validation_for(alg: Algorithm, options: &ValidationOptions) -> Validation {
    let mut validation = Validation::new(alg);
    validation.validate_exp = options.verify_exp;
    if !options.verify_exp {
        validation.required_spec_claims.remove("exp");
    }
    match (&options.audience, options.verify_aud) {
        (Some(aud), true) => {
            validation.set_audience(&[aud]);
            validation.required_spec_claims.insert("aud".into());
        }
        _ => validation.validate_aud = false,
    }
    if let (Some(iss), true) = (&options.issuer, options.verify_iss) {
        validation.set_issuer(&[iss]);
        validation.required_spec_claims.insert("iss".into());
    }
    validation
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> ValidationError {
    match err.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => ValidationError::InvalidSignature,
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => ValidationError::Expired,
        ErrorKind::InvalidAudience => ValidationError::AudienceMismatch,
        ErrorKind::InvalidIssuer => ValidationError::IssuerMismatch,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "aud" => ValidationError::AudienceMismatch,
            "iss" => ValidationError::IssuerMismatch,
            _ => ValidationError::Malformed(format!("missing claim: {claim}")),
        },
        _ => ValidationError::Malformed(err.to_string()),
    }
}

async fn fetch_jwks(client: &reqwest::Client, url: &str) -> Result<JwkSet> {
    let resp = client
        .get(url)
        .send()
        .await
        .context("failed to fetch JWKS")?
        .error_for_status()
        .context("JWKS endpoint returned an error")?;
    let jwks = resp
        .json::<JwkSet>()
        .await
        .context("failed to parse JWKS")?;
    Ok(jwks)
}
