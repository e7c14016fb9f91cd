//! One gateway session over streamable HTTP.
//!
//! A session lives for exactly one logical operation: it is opened, performs
//! the initialize handshake, carries the requests of that operation and is
//! closed again by the owner on every exit path.

use super::protocol;
use crate::mcp::error::GatewayError;
use crate::mcp::transport::http::{
    apply_session_header, apply_streamable_http_client_post_headers,
    apply_streamable_http_protocol_version_header, response_session_id,
};
use crate::mcp::transport::streamable_http::{
    is_event_stream_content_type, next_sse_server_message,
};
use rust_mcp_schema::schema_utils::{
    ClientMessage, FromMessage, MessageFromClient, NotificationFromClient, RequestFromClient,
    ServerMessage,
};
use rust_mcp_schema::{
    ClientCapabilities, Implementation, InitializeRequestParams, InitializeResult, RequestId,
};
use std::time::Duration;
use tracing::debug;

const SESSION_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct GatewaySession {
    client: reqwest::Client,
    endpoint: String,
    requested_protocol_version: String,
    negotiated_protocol_version: Option<String>,
    session_id: Option<String>,
    next_request_id: i64,
    server_details: Option<InitializeResult>,
}

impl GatewaySession {
    pub(crate) fn open(
        client: reqwest::Client,
        endpoint: &str,
        protocol_version: Option<&str>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            requested_protocol_version: protocol::requested_protocol_version(protocol_version),
            negotiated_protocol_version: None,
            session_id: None,
            next_request_id: 0,
            server_details: None,
        }
    }

    pub(crate) fn server_details(&self) -> Option<&InitializeResult> {
        self.server_details.as_ref()
    }

    fn effective_protocol_version(&self) -> &str {
        match self.negotiated_protocol_version.as_deref() {
            Some(version) if !version.trim().is_empty() => version,
            _ => &self.requested_protocol_version,
        }
    }

    /// Performs initialize + notifications/initialized. Must succeed before any
    /// other request is sent on this session.
    pub(crate) async fn initialize(&mut self) -> Result<(), GatewayError> {
        let params = client_details(&self.requested_protocol_version);
        let response = self
            .request(RequestFromClient::InitializeRequest(params))
            .await
            .map_err(GatewayError::into_handshake)?;
        let initialize =
            protocol::parse_initialize_result(response).map_err(GatewayError::into_handshake)?;
        self.negotiated_protocol_version = Some(initialize.protocol_version.clone());
        self.server_details = Some(initialize);

        if self.session_id.is_none() {
            debug!(endpoint = %self.endpoint, "Gateway did not assign a session id");
        }

        self.notify(NotificationFromClient::InitializedNotification(None))
            .await
            .map_err(GatewayError::into_handshake)
    }

    pub(crate) async fn request(
        &mut self,
        request: RequestFromClient,
    ) -> Result<ServerMessage, GatewayError> {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.saturating_add(1);
        let message = ClientMessage::from_message(
            MessageFromClient::RequestFromClient(request),
            Some(RequestId::Integer(request_id)),
        )
        .map_err(|err| GatewayError::Protocol(err.to_string()))?;

        let response = self.post(&message).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        if is_event_stream_content_type(&content_type) {
            next_sse_server_message(response).await
        } else {
            let body = response
                .bytes()
                .await
                .map_err(|err| GatewayError::Transport(err.to_string()))?;
            serde_json::from_slice::<ServerMessage>(&body)
                .map_err(|err| GatewayError::Protocol(err.to_string()))
        }
    }

    async fn notify(&mut self, notification: NotificationFromClient) -> Result<(), GatewayError> {
        let message = ClientMessage::from_message(
            MessageFromClient::NotificationFromClient(notification),
            None,
        )
        .map_err(|err| GatewayError::Protocol(err.to_string()))?;
        self.post(&message).await.map(|_| ())
    }

    async fn post(&mut self, message: &ClientMessage) -> Result<reqwest::Response, GatewayError> {
        let payload =
            serde_json::to_string(message).map_err(|err| GatewayError::Protocol(err.to_string()))?;
        debug!(url = %self.endpoint, "Sending MCP HTTP request");
        let request = apply_session_header(
            apply_streamable_http_protocol_version_header(
                apply_streamable_http_client_post_headers(self.client.post(&self.endpoint)),
                Some(self.effective_protocol_version()),
            ),
            self.session_id.as_deref(),
        )
        .body(payload);

        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }
        if let Some(session_id) = response_session_id(&response) {
            self.session_id = Some(session_id);
        }
        Ok(response)
    }

    /// Sends DELETE for the session, if the gateway assigned one. Failures
    /// are only logged.
    pub(crate) async fn close(self) {
        let Some(session_id) = self.session_id.as_deref() else {
            return;
        };

        let request = apply_session_header(
            apply_streamable_http_protocol_version_header(
                self.client.delete(&self.endpoint),
                Some(self.effective_protocol_version()),
            ),
            Some(session_id),
        );

        match tokio::time::timeout(SESSION_CLOSE_TIMEOUT, request.send()).await {
            Ok(Ok(response)) => {
                debug!(url = %self.endpoint, status = %response.status(), "Closed MCP session");
            }
            Ok(Err(err)) => {
                debug!(url = %self.endpoint, error = %err, "Failed to close MCP session");
            }
            Err(_) => {
                debug!(url = %self.endpoint, "Timed out closing MCP session");
            }
        }
    }
}

fn client_details(protocol_version: &str) -> InitializeRequestParams {
    InitializeRequestParams {
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "searchlight".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("Searchlight MCP Client".to_string()),
            description: Some("Search dispatch for searchlight chat turns".to_string()),
            icons: Vec::new(),
            website_url: None,
        },
        meta: None,
        protocol_version: protocol_version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiated_version_wins_over_requested() {
        let mut session =
            GatewaySession::open(reqwest::Client::new(), "http://127.0.0.1:9", Some("2025-01-01"));
        assert_eq!(session.effective_protocol_version(), "2025-01-01");
        session.negotiated_protocol_version = Some("2025-11-25".to_string());
        assert_eq!(session.effective_protocol_version(), "2025-11-25");
    }

    #[tokio::test]
    async fn initialize_against_closed_port_is_a_handshake_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let mut session = GatewaySession::open(
            reqwest::Client::builder()
                .no_proxy()
                .build()
                .expect("client"),
            &format!("http://{addr}"),
            None,
        );
        let err = session.initialize().await.expect_err("nothing is listening");
        assert!(matches!(err, GatewayError::Handshake(_)));
        session.close().await;
    }
}
