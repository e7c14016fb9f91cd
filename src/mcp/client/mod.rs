//! Gateway client: one short-lived MCP session per operation.
//!
//! Every public operation opens a session, performs the initialize
//! handshake, issues its requests, and closes the session again whether the
//! work succeeded, failed, or ran out of time.

use crate::mcp::error::GatewayError;
use crate::mcp::transport::is_method_not_found;
use async_trait::async_trait;
use rust_mcp_schema::schema_utils::RequestFromClient;
use rust_mcp_schema::{CallToolRequestParams, PaginatedRequestParams};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

mod protocol;
mod session;

pub use protocol::ToolOutput;
use session::GatewaySession;

const MCP_MAX_TOOL_LIST: usize = 100;
const MCP_HTTP_CONNECT_TIMEOUT_SECONDS: u64 = 10;
const MCP_HTTP_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;
const MCP_HTTP_POOL_MAX_IDLE_PER_HOST: usize = 8;

fn build_mcp_http_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(MCP_HTTP_CONNECT_TIMEOUT_SECONDS))
        .pool_idle_timeout(Duration::from_secs(MCP_HTTP_POOL_IDLE_TIMEOUT_SECONDS))
        .pool_max_idle_per_host(MCP_HTTP_POOL_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|err| err.to_string())
}

/// A single tool invocation against a gateway endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub endpoint: String,
    pub tool_name: String,
    /// Alternative names for the same tool. When non-empty the gateway's tool
    /// list is consulted and the first offered name (starting with
    /// `tool_name`) is called.
    pub synonyms: Vec<String>,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(
        endpoint: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            tool_name: tool_name.into(),
            synonyms: Vec::new(),
            arguments,
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    fn candidates(&self) -> Vec<String> {
        let mut candidates = vec![self.tool_name.clone()];
        for synonym in &self.synonyms {
            if !candidates.contains(synonym) {
                candidates.push(synonym.clone());
            }
        }
        candidates
    }
}

/// Seam between the search dispatcher and the network.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    async fn call_tool(&self, request: &ToolCallRequest) -> Result<ToolOutput, GatewayError>;
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    call_timeout: Duration,
    protocol_version: Option<String>,
}

impl GatewayClient {
    pub fn new(
        call_timeout: Duration,
        protocol_version: Option<String>,
    ) -> Result<Self, GatewayError> {
        let http = build_mcp_http_client()
            .map_err(|err| GatewayError::Transport(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self::with_http_client(http, call_timeout, protocol_version))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        call_timeout: Duration,
        protocol_version: Option<String>,
    ) -> Self {
        Self {
            http,
            call_timeout,
            protocol_version,
        }
    }

    /// Calls `tool` on `endpoint` and returns its text, or the empty-result
    /// sentinel when the gateway returned nothing readable.
    pub async fn invoke(
        &self,
        endpoint: &str,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, GatewayError> {
        let request = ToolCallRequest::new(endpoint, tool, arguments);
        self.call_tool(&request)
            .await
            .map(|output| output.into_text(tool))
    }

    /// Lists the tool names offered by a gateway.
    pub async fn list_tools(&self, endpoint: &str) -> Result<Vec<String>, GatewayError> {
        let mut session = self.open(endpoint);
        let outcome = self
            .bounded(async {
                session.initialize().await?;
                fetch_tool_names(&mut session).await
            })
            .await;
        session.close().await;
        outcome
    }

    fn open(&self, endpoint: &str) -> GatewaySession {
        debug!(endpoint, "Opening MCP session");
        GatewaySession::open(self.http.clone(), endpoint, self.protocol_version.as_deref())
    }

    async fn bounded<T>(
        &self,
        work: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.call_timeout, work).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayError::TimedOut {
                after: self.call_timeout,
            }),
        }
    }
}

#[async_trait]
impl ToolGateway for GatewayClient {
    async fn call_tool(&self, request: &ToolCallRequest) -> Result<ToolOutput, GatewayError> {
        let mut session = self.open(&request.endpoint);
        let outcome = self.bounded(run_tool_call(&mut session, request)).await;
        session.close().await;
        if let Err(err) = &outcome {
            warn!(
                endpoint = %request.endpoint,
                tool = %request.tool_name,
                error = %err,
                "MCP tool call failed"
            );
        }
        outcome
    }
}

async fn run_tool_call(
    session: &mut GatewaySession,
    request: &ToolCallRequest,
) -> Result<ToolOutput, GatewayError> {
    session.initialize().await?;

    let tool_name = if request.synonyms.is_empty() {
        request.tool_name.clone()
    } else {
        resolve_tool_name(session, request).await?
    };

    debug!(endpoint = %request.endpoint, tool = %tool_name, "Calling MCP tool");
    let params = CallToolRequestParams::new(&tool_name).with_arguments(request.arguments.clone());
    let response = session
        .request(RequestFromClient::CallToolRequest(params))
        .await?;
    let result = protocol::parse_call_tool(response)?;
    if result.is_error.unwrap_or(false) {
        warn!(tool = %tool_name, "MCP tool reported an error result");
    }
    Ok(protocol::first_block_output(&result))
}

async fn resolve_tool_name(
    session: &mut GatewaySession,
    request: &ToolCallRequest,
) -> Result<String, GatewayError> {
    let offered = fetch_tool_names(session).await?;
    let candidates = request.candidates();
    let chosen = candidates
        .iter()
        .find(|candidate| offered.contains(candidate))
        .cloned();
    chosen.ok_or(GatewayError::ToolUnavailable { candidates })
}

async fn fetch_tool_names(session: &mut GatewaySession) -> Result<Vec<String>, GatewayError> {
    let supports_tools = session
        .server_details()
        .map(|details| details.capabilities.tools.is_some())
        .unwrap_or(true);
    if !supports_tools {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let params = cursor.take().map(|cursor| PaginatedRequestParams {
            cursor: Some(cursor),
            meta: None,
        });
        let response = session
            .request(RequestFromClient::ListToolsRequest(params))
            .await?;
        if is_method_not_found(&response) {
            break;
        }

        let list = protocol::parse_list_tools(response)?;
        names.extend(list.tools.into_iter().map(|tool| tool.name));
        if names.len() >= MCP_MAX_TOOL_LIST {
            names.truncate(MCP_MAX_TOOL_LIST);
            break;
        }
        match list.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(names)
}
