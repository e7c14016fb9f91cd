//! Typed failures for gateway tool calls.
//!
//! Callers branch on [`GatewayErrorKind`]; the conversation only ever sees the
//! rendered sentinel text from [`GatewayError::sentinel`].

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Configuration,
    Transport,
    Handshake,
    Protocol,
    Rpc,
    ToolUnavailable,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The endpoint for the gateway was never configured.
    Unconfigured { setting: &'static str },
    /// Connection refused, HTTP status failures, broken streams.
    Transport(String),
    /// The initialize exchange did not produce a usable session.
    Handshake(String),
    /// The gateway answered with something that is not a valid response.
    Protocol(String),
    /// The gateway answered with a JSON-RPC error object.
    Rpc { code: i64, message: String },
    /// None of the candidate tool names is offered by the gateway.
    ToolUnavailable { candidates: Vec<String> },
    /// The call did not complete within the configured budget.
    TimedOut { after: Duration },
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Unconfigured { .. } => GatewayErrorKind::Configuration,
            GatewayError::Transport(_) => GatewayErrorKind::Transport,
            GatewayError::Handshake(_) => GatewayErrorKind::Handshake,
            GatewayError::Protocol(_) => GatewayErrorKind::Protocol,
            GatewayError::Rpc { .. } => GatewayErrorKind::Rpc,
            GatewayError::ToolUnavailable { .. } => GatewayErrorKind::ToolUnavailable,
            GatewayError::TimedOut { .. } => GatewayErrorKind::Timeout,
        }
    }

    /// Renders the placeholder text that stands in for the tool output.
    pub fn sentinel(&self, label: &str) -> String {
        match self {
            GatewayError::Unconfigured { setting } => {
                format!("[MCP] {label} unavailable: {setting} is not set.")
            }
            GatewayError::TimedOut { after } => {
                format!("[MCP] {label} timed out after {}s.", after.as_secs())
            }
            other => format!("[MCP] {label} failed: {other}"),
        }
    }

    /// Handshake failures are reported as such even when the root cause was
    /// a transport or protocol problem during initialize.
    pub(crate) fn into_handshake(self) -> Self {
        match self {
            GatewayError::Transport(message) | GatewayError::Protocol(message) => {
                GatewayError::Handshake(message)
            }
            GatewayError::Rpc { code, message } => {
                GatewayError::Handshake(format!("MCP error {code}: {message}"))
            }
            other => other,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unconfigured { setting } => write!(f, "{setting} is not set"),
            GatewayError::Transport(message) => write!(f, "transport error: {message}"),
            GatewayError::Handshake(message) => write!(f, "initialize failed: {message}"),
            GatewayError::Protocol(message) => write!(f, "protocol error: {message}"),
            GatewayError::Rpc { code, message } => write!(f, "MCP error {code}: {message}"),
            GatewayError::ToolUnavailable { candidates } => {
                write!(f, "gateway offers none of: {}", candidates.join(", "))
            }
            GatewayError::TimedOut { after } => {
                write!(f, "timed out after {}s", after.as_secs())
            }
        }
    }
}

impl StdError for GatewayError {}
