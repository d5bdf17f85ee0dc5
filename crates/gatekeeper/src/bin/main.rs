//! Binary entry point for the mcp-gatekeeper gateway.

use clap::Parser;
use mcp_gatekeeper::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let config = Config::parse();
    mcp_gatekeeper::serve(config).await
}
