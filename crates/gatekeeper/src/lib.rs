//! OAuth-protected MCP gateway.
//!
//! Serves an MCP tool endpoint at `/mcp` behind the bearer-token middleware
//! from [`rmcp_auth`], together with the public Protected Resource Metadata
//! document and a health probe.

pub mod config;
pub mod server;
pub mod tools;

pub use config::{Config, ConfigError};
pub use server::{HEALTH_PATH, MCP_PATH, mcp_router, router, serve};
pub use tools::ToolServer;
