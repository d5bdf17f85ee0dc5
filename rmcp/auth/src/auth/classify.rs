//! Request classification.
//!
//! Decides which authorization rules apply to a request from its path and
//! the shape of its JSON-RPC body.

use serde::Deserialize;

/// JSON-RPC method name of an MCP tool invocation.
pub const TOOL_CALL_METHOD: &str = "tools/call";

/// Authorization class of an inbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Public discovery endpoint, never authenticated.
    Discovery,
    /// Tool invocation, requires the elevated scope.
    ToolCall,
    /// Anything else, requires a valid token only.
    Plain,
}

#[derive(Deserialize)]
struct Envelope {
    method: Option<String>,
}

/// Classify a request body.
///
/// Parsing is best-effort: a body that is not a JSON object with a string
/// `method` field is [`RequestKind::Plain`].
pub fn classify_body(body: &[u8]) -> RequestKind {
    match serde_json::from_slice::<Envelope>(body) {
        Ok(Envelope {
            method: Some(method),
        }) if method == TOOL_CALL_METHOD => RequestKind::ToolCall,
        _ => RequestKind::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestKind, classify_body};

    #[test]
    fn tool_call_is_elevated() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"add_number"}}"#;
        assert_eq!(classify_body(body), RequestKind::ToolCall);
        assert_eq!(classify_body(br#"{"method":"tools/call"}"#), RequestKind::ToolCall);
    }

    #[test]
    fn other_methods_are_plain() {
        assert_eq!(classify_body(br#"{"method":"tools/list"}"#), RequestKind::Plain);
        assert_eq!(classify_body(br#"{"method":"initialize"}"#), RequestKind::Plain);
        assert_eq!(classify_body(br#"{}"#), RequestKind::Plain);
    }

    #[test]
    fn unusual_shapes_are_plain() {
        assert_eq!(classify_body(b""), RequestKind::Plain);
        assert_eq!(classify_body(b"not json"), RequestKind::Plain);
        assert_eq!(classify_body(br#"{"method":42}"#), RequestKind::Plain);
        assert_eq!(classify_body(br#"[{"method":"tools/call"}]"#), RequestKind::Plain);
        assert_eq!(classify_body(br#""tools/call""#), RequestKind::Plain);
    }
}
