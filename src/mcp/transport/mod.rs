//! Streamable HTTP plumbing shared by gateway sessions.
//!
//! Gateways answer a POST either with a single JSON body or with an
//! event-stream that eventually carries the response; both are normalized to
//! one [`ServerMessage`] here.

use rust_mcp_schema::schema_utils::ServerMessage;

pub mod http;
pub mod streamable_http;

/// JSON-RPC code used by servers to indicate unsupported methods.
pub const MCP_METHOD_NOT_FOUND: i64 = -32601;

/// Returns true when a server reports the JSON-RPC method-not-found code.
pub fn is_method_not_found(message: &ServerMessage) -> bool {
    matches!(
        message,
        ServerMessage::Error(error) if error.error.code == MCP_METHOD_NOT_FOUND
    )
}
