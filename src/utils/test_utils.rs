#[cfg(test)]
use crate::core::chat_stream::{LanguageModel, ModelError};
#[cfg(test)]
use crate::mcp::client::{ToolCallRequest, ToolGateway, ToolOutput};
#[cfg(test)]
use crate::mcp::error::GatewayError;
#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use std::time::Duration;
#[cfg(test)]
use tokio::io::AsyncReadExt;
#[cfg(test)]
use tokio::net::TcpStream;

/// In-memory gateway keyed by tool name. Unknown tools fail as unavailable.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct FakeGateway {
    responses: Arc<Mutex<HashMap<String, Result<ToolOutput, GatewayError>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    calls: Arc<Mutex<Vec<ToolCallRequest>>>,
}

#[cfg(test)]
impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, tool: &str, text: &str) -> Self {
        self.with_output(tool, ToolOutput::Text(text.to_string()))
    }

    pub fn with_output(self, tool: &str, output: ToolOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(tool.to_string(), Ok(output));
        self
    }

    pub fn with_error(self, tool: &str, error: GatewayError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(tool.to_string(), Err(error));
        self
    }

    pub fn with_delay(self, tool: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(tool.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<ToolCallRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ToolGateway for FakeGateway {
    async fn call_tool(&self, request: &ToolCallRequest) -> Result<ToolOutput, GatewayError> {
        self.calls.lock().unwrap().push(request.clone());
        let delay = self.delays.lock().unwrap().get(&request.tool_name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(&request.tool_name)
            .cloned()
            .unwrap_or_else(|| {
                Err(GatewayError::ToolUnavailable {
                    candidates: vec![request.tool_name.clone()],
                })
            })
    }
}

/// Language model that records every prompt and answers with a fixed reply.
#[cfg(test)]
#[derive(Clone)]
pub struct FakeModel {
    reply: Result<String, ModelError>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[cfg(test)]
impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing(error: ModelError) -> Self {
        Self {
            reply: Err(error),
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

/// Reads one HTTP/1.1 request: request line, headers, and a
/// `content-length` delimited body.
#[cfg(test)]
pub async fn read_http_request(
    stream: &mut TcpStream,
) -> Result<(String, Vec<(String, String)>, Vec<u8>), String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length.saturating_sub(body.len())];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok((request_line, headers, body))
}

#[cfg(test)]
pub fn header(headers: &[(String, String)], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}
