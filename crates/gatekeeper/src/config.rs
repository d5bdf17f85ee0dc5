//! Command line and environment configuration.
//!
//! Parsed once at startup; the values derived from it are immutable and
//! handed to the middleware by value.

use clap::Parser;
use rmcp_auth::auth::DEFAULT_MAX_BODY_BYTES;
use rmcp_auth::auth::oauth::{MetadataError, ProtectedResourceMetadata, ResourceServerConfig};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. All of them abort startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid resource metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("resource metadata URL cannot be used in a challenge header: {0}")]
    MetadataUrl(String),

    #[error("validation timeout must be greater than zero")]
    ZeroTimeout,
}

/// OAuth-protected MCP gateway.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-gatekeeper", version, about)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "GATEKEEPER_BIND", default_value = "0.0.0.0:8002")]
    pub bind: SocketAddr,

    /// Authorization server base URL; the trusted token issuer.
    #[arg(long, env = "GATEKEEPER_ISSUER")]
    pub issuer: String,

    /// Audience tokens must be minted for. Audience is not checked if unset.
    #[arg(long, env = "GATEKEEPER_AUDIENCE")]
    pub audience: Option<String>,

    /// JWKS endpoint. Defaults to `<issuer>/keys`.
    #[arg(long, env = "GATEKEEPER_JWKS_URL")]
    pub jwks_url: Option<String>,

    /// Canonical URL of this protected resource, e.g. `https://mcp.example.com/mcp`.
    #[arg(long, env = "GATEKEEPER_RESOURCE")]
    pub resource: String,

    /// Authorization servers to advertise. Defaults to the issuer.
    #[arg(
        long = "authorization-server",
        env = "GATEKEEPER_AUTHORIZATION_SERVERS",
        value_delimiter = ','
    )]
    pub authorization_servers: Vec<String>,

    /// Documentation link to advertise.
    #[arg(long, env = "GATEKEEPER_RESOURCE_DOCUMENTATION")]
    pub resource_documentation: Option<String>,

    /// Discovery URL used in challenges. Derived from the resource if unset.
    #[arg(long, env = "GATEKEEPER_RESOURCE_METADATA_URL")]
    pub resource_metadata_url: Option<String>,

    /// Scopes to advertise.
    #[arg(
        long,
        env = "GATEKEEPER_SCOPES_SUPPORTED",
        value_delimiter = ',',
        default_value = "search:read"
    )]
    pub scopes_supported: Vec<String>,

    /// Scopes required for `tools/call` requests.
    #[arg(
        long = "tool-scope",
        env = "GATEKEEPER_TOOL_SCOPES",
        value_delimiter = ',',
        default_value = "search:read"
    )]
    pub tool_scopes: Vec<String>,

    /// Upper bound on a single token validation, in seconds.
    #[arg(long, env = "GATEKEEPER_VALIDATION_TIMEOUT_SECS", default_value_t = 5)]
    pub validation_timeout_secs: u64,

    /// Largest request body buffered for classification.
    #[arg(long, env = "GATEKEEPER_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl Config {
    /// The discovery document, checked for completeness.
    pub fn metadata(&self) -> Result<ProtectedResourceMetadata, ConfigError> {
        let mut metadata = ProtectedResourceMetadata::new(&self.resource);
        if self.authorization_servers.is_empty() {
            metadata = metadata.authorization_server(&self.issuer);
        }
        for server in &self.authorization_servers {
            metadata = metadata.authorization_server(server);
        }
        for scope in &self.scopes_supported {
            metadata = metadata.scope(scope);
        }
        if let Some(ref docs) = self.resource_documentation {
            metadata = metadata.documentation(docs);
        }
        metadata.validate()?;
        Ok(metadata)
    }

    /// Resource server settings for the authorization middleware.
    pub fn resource_server(
        &self,
        metadata: &ProtectedResourceMetadata,
    ) -> Result<ResourceServerConfig, ConfigError> {
        let url = match self.resource_metadata_url {
            Some(ref url) => url.clone(),
            None => metadata.metadata_url()?,
        };

        let mut config = ResourceServerConfig::new(url).issuer(&self.issuer);
        if let Some(ref audience) = self.audience {
            config = config.audience(audience);
        }
        for scope in &self.tool_scopes {
            config = config.tool_scope(scope);
        }

        if config.challenge().is_err() {
            return Err(ConfigError::MetadataUrl(config.resource_metadata_url));
        }
        Ok(config)
    }

    pub fn jwks_url(&self) -> String {
        match self.jwks_url {
            Some(ref url) => url.clone(),
            None => format!("{}/keys", self.issuer.trim_end_matches('/')),
        }
    }

    pub fn validation_timeout(&self) -> Result<Duration, ConfigError> {
        match self.validation_timeout_secs {
            0 => Err(ConfigError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError};
    use clap::Parser;

    fn parse(extra: &[&str]) -> Config {
        let mut args = vec![
            "mcp-gatekeeper",
            "--issuer",
            "https://auth.example.com/",
            "--resource",
            "https://mcp.example.com/mcp",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.bind.port(), 8002);
        assert_eq!(config.jwks_url(), "https://auth.example.com/keys");
        assert_eq!(config.tool_scopes, vec!["search:read"]);
        assert_eq!(config.validation_timeout().unwrap().as_secs(), 5);

        let metadata = config.metadata().unwrap();
        assert_eq!(metadata.authorization_servers, vec!["https://auth.example.com/"]);
        assert_eq!(metadata.bearer_methods_supported, vec!["header"]);

        let rs = config.resource_server(&metadata).unwrap();
        assert_eq!(
            rs.resource_metadata_url,
            "https://mcp.example.com/.well-known/oauth-protected-resource/mcp"
        );
        assert_eq!(rs.issuer.as_deref(), Some("https://auth.example.com/"));
        assert!(rs.audience.is_none());
    }

    #[test]
    fn explicit_values() {
        let config = parse(&[
            "--authorization-server",
            "https://a.example.com,https://b.example.com",
            "--tool-scope",
            "search:read,tools:call",
            "--audience",
            "mcp",
            "--resource-metadata-url",
            "https://cdn.example.com/prm.json",
            "--jwks-url",
            "https://auth.example.com/.well-known/jwks.json",
        ]);
        let metadata = config.metadata().unwrap();
        assert_eq!(
            metadata.authorization_servers,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        let rs = config.resource_server(&metadata).unwrap();
        assert_eq!(rs.resource_metadata_url, "https://cdn.example.com/prm.json");
        assert_eq!(rs.audience.as_deref(), Some("mcp"));
        assert_eq!(rs.tool_scopes.len(), 2);
        assert_eq!(config.jwks_url(), "https://auth.example.com/.well-known/jwks.json");
    }

    #[test]
    fn rejects_relative_resource() {
        let config = Config::try_parse_from([
            "mcp-gatekeeper",
            "--issuer",
            "https://auth.example.com",
            "--resource",
            "/mcp",
        ])
        .unwrap();
        assert!(matches!(config.metadata(), Err(ConfigError::Metadata(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = parse(&["--validation-timeout-secs", "0"]);
        assert!(matches!(
            config.validation_timeout(),
            Err(ConfigError::ZeroTimeout)
        ));
    }
}
