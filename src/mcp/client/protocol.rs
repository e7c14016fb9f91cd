use crate::mcp::error::GatewayError;
use rust_mcp_schema::schema_utils::ServerMessage;
use rust_mcp_schema::{
    CallToolResult, ContentBlock, InitializeResult, ListToolsResult, RpcError,
    LATEST_PROTOCOL_VERSION,
};
use serde_json::Value;

/// What the first content block of a tool result turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Text(String),
    NoContent,
    NonText,
}

impl ToolOutput {
    /// Renders the output as conversation text, substituting sentinels for
    /// results that carry nothing readable.
    pub fn into_text(self, label: &str) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::NoContent => format!("[MCP] {label} returned no content."),
            ToolOutput::NonText => format!("[MCP] {label} returned non-text content."),
        }
    }
}

pub(crate) fn requested_protocol_version(configured: Option<&str>) -> String {
    match configured {
        Some(version) if !version.trim().is_empty() => version.to_string(),
        _ => LATEST_PROTOCOL_VERSION.to_string(),
    }
}

pub(crate) fn parse_initialize_result(
    message: ServerMessage,
) -> Result<InitializeResult, GatewayError> {
    let value = parse_response_value(message)?;
    let result = serde_json::from_value::<InitializeResult>(value)
        .map_err(|err| GatewayError::Protocol(err.to_string()))?;
    if result.protocol_version.trim().is_empty() {
        return Err(GatewayError::Protocol(
            "Unexpected initialize response.".to_string(),
        ));
    }
    Ok(result)
}

pub(crate) fn parse_list_tools(message: ServerMessage) -> Result<ListToolsResult, GatewayError> {
    parse_response(message)
}

pub(crate) fn parse_call_tool(message: ServerMessage) -> Result<CallToolResult, GatewayError> {
    parse_response(message)
}

/// Only the first content block is consulted; the rest are ignored.
pub(crate) fn first_block_output(result: &CallToolResult) -> ToolOutput {
    match result.content.first() {
        None => ToolOutput::NoContent,
        Some(ContentBlock::TextContent(text)) => ToolOutput::Text(text.text.clone()),
        Some(_) => ToolOutput::NonText,
    }
}

fn parse_response<T: serde::de::DeserializeOwned>(
    message: ServerMessage,
) -> Result<T, GatewayError> {
    let value = parse_response_value(message)?;
    serde_json::from_value::<T>(value).map_err(|err| GatewayError::Protocol(err.to_string()))
}

pub(crate) fn parse_response_value(message: ServerMessage) -> Result<Value, GatewayError> {
    match message {
        ServerMessage::Response(response) => serde_json::to_value(&response.result)
            .map_err(|err| GatewayError::Protocol(err.to_string())),
        ServerMessage::Error(error) => Err(rpc_error(&error.error)),
        other => Err(GatewayError::Protocol(format!(
            "Unexpected MCP server message: {other:?}"
        ))),
    }
}

fn rpc_error(error: &RpcError) -> GatewayError {
    let mut message = error.message.clone();
    if let Some(data) = &error.data {
        let details = data
            .get("details")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
            .or_else(|| data.as_str().map(|value| value.to_string()))
            .or_else(|| serde_json::to_string(data).ok());

        if let Some(details) = details {
            if !details.is_empty() {
                message.push_str(" (");
                message.push_str(&details);
                message.push(')');
            }
        }
    }
    GatewayError::Rpc {
        code: error.code,
        message,
    }
}
