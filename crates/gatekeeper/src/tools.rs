//! Tools served behind the gateway.
//!
//! These are placeholders: the gateway's job is to guard them, not to
//! compute anything interesting.

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars::{self, JsonSchema},
    tool, tool_handler, tool_router,
};
use serde::Deserialize;

/// Fixed offset applied by `add_number`.
const ADD_OFFSET: i64 = 10;

/// Value reported by `tell_me_data`.
const SAMPLE_DATA: i64 = 10;

/// Value reported by `whatISThePSyco`.
const PSYCO_VALUE: i64 = 10;

/// Parameters for the `add_number` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddNumberParams {
    /// First addend.
    pub a: i64,
    /// Second addend.
    pub b: i64,
}

/// MCP tool server.
#[derive(Debug, Clone)]
pub struct ToolServer {
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ToolServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    /// Add two numbers plus a fixed offset.
    #[tool(description = "Add two numbers, plus a fixed offset of 10")]
    async fn add_number(
        &self,
        Parameters(params): Parameters<AddNumberParams>,
    ) -> Result<String, String> {
        params
            .a
            .checked_add(params.b)
            .and_then(|sum| sum.checked_add(ADD_OFFSET))
            .map(|sum| sum.to_string())
            .ok_or_else(|| "Result out of range".to_string())
    }

    /// Return the sample data value.
    #[tool(description = "Return the sample data value")]
    async fn tell_me_data(&self) -> Result<String, String> {
        Ok(SAMPLE_DATA.to_string())
    }

    /// Return the fixed psyco value.
    #[tool(name = "whatISThePSyco", description = "Return the psyco value")]
    async fn what_is_the_psyco(&self) -> Result<String, String> {
        Ok(PSYCO_VALUE.to_string())
    }
}

impl Default for ToolServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for ToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-gatekeeper".into(),
                title: Some("MCP Gatekeeper".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Protected tool server. Tool calls require the search:read scope.".into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tools::{AddNumberParams, ToolServer};
    use rmcp::handler::server::wrapper::Parameters;

    #[tokio::test]
    async fn add_number_applies_offset() {
        let server = ToolServer::new();
        let result = server
            .add_number(Parameters(AddNumberParams { a: 2, b: 3 }))
            .await;
        assert_eq!(result.expect("should succeed"), "15");
    }

    #[tokio::test]
    async fn add_number_overflow() {
        let server = ToolServer::new();
        let result = server
            .add_number(Parameters(AddNumberParams { a: i64::MAX, b: 1 }))
            .await;
        assert!(result.unwrap_err().contains("out of range"));
    }

    #[tokio::test]
    async fn tell_me_data_reports_sample() {
        let server = ToolServer::new();
        assert_eq!(server.tell_me_data().await.expect("should succeed"), "10");
    }

    #[tokio::test]
    async fn what_is_the_psyco_reports_value() {
        let server = ToolServer::new();
        assert_eq!(
            server.what_is_the_psyco().await.expect("should succeed"),
            "10"
        );
    }

    #[test]
    fn registers_all_placeholder_tools() {
        let names: Vec<_> = ToolServer::new()
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        for name in ["add_number", "tell_me_data", "whatISThePSyco"] {
            assert!(names.iter().any(|n| n == name), "missing tool {name}");
        }
    }
}
