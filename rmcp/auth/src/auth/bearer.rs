//! Bearer token extraction.
//!
//! Pulls the token out of `Authorization: Bearer <token>`. The scheme is
//! matched literally, with a single space separator.

use crate::auth::AuthError;
use http::HeaderMap;

/// Literal scheme prefix of a bearer credential.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Number of token characters that may appear in logs.
const LOG_PREFIX_CHARS: usize = 8;

/// Extract the bearer token from request headers.
///
/// Header lookup is case-insensitive. Whitespace around the token is
/// stripped; a blank token is rejected.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let token = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token)
}

/// The part of a token that is safe to log.
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(LOG_PREFIX_CHARS) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

#[cfg(test)]
mod tests {
    use super::{bearer_token, token_prefix};
    use crate::auth::AuthError;
    use http::{HeaderMap, HeaderValue};

    fn headers(name: &'static str, value: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(name, HeaderValue::from_static(value));
        map
    }

    #[test]
    fn extracts_and_trims_token() {
        let map = headers("authorization", "Bearer   abc.def.ghi  ");
        assert_eq!(bearer_token(&map), Ok("abc.def.ghi"));
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let map = headers("AUTHORIZATION", "Bearer token");
        assert_eq!(bearer_token(&map), Ok("token"));
    }

    #[test]
    fn missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingHeader));
    }

    #[test]
    fn wrong_scheme() {
        let map = headers("authorization", "Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&map), Err(AuthError::MissingHeader));
        let map = headers("authorization", "bearer token");
        assert_eq!(bearer_token(&map), Err(AuthError::MissingHeader));
        let map = headers("authorization", "Bearer");
        assert_eq!(bearer_token(&map), Err(AuthError::MissingHeader));
    }

    #[test]
    fn whitespace_only_token() {
        let map = headers("authorization", "Bearer    ");
        assert_eq!(bearer_token(&map), Err(AuthError::EmptyToken));
    }

    #[test]
    fn prefix_is_bounded() {
        assert_eq!(token_prefix("eyJhbGciOiJSUzI1NiJ9.payload"), "eyJhbGci");
        assert_eq!(token_prefix("short"), "short");
        assert_eq!(token_prefix("ééééééééé"), "éééééééé");
    }
}
