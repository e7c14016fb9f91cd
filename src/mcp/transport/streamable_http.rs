use futures_util::StreamExt;
use rust_mcp_schema::schema_utils::ServerMessage;
use tracing::trace;

use crate::mcp::error::GatewayError;

#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_lines(false)
    }

    pub fn finish(&mut self) -> Vec<String> {
        self.drain_lines(true)
    }

    fn drain_lines(&mut self, flush: bool) -> Vec<String> {
        let mut lines = Vec::new();
        let mut search_index = 0;

        while let Some(relative_pos) = memchr::memchr(b'\n', &self.buffer[search_index..]) {
            let newline_index = search_index + relative_pos;
            let mut line_end = newline_index;
            if line_end > search_index && self.buffer[line_end - 1] == b'\r' {
                line_end -= 1;
            }

            if let Ok(text) = std::str::from_utf8(&self.buffer[search_index..line_end]) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }

            search_index = newline_index + 1;
        }

        if flush {
            if let Ok(text) = std::str::from_utf8(&self.buffer[search_index..]) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
            self.buffer.clear();
        } else if search_index > 0 {
            self.buffer.drain(..search_index);
        }

        lines
    }
}

pub fn is_event_stream_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|value| value.eq_ignore_ascii_case("text/event-stream"))
}

pub fn sse_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

/// Reads an event-stream until the first response or error message.
///
/// Server-initiated requests and notifications interleaved before the
/// response are skipped; gateways used here never need an answer to them.
pub async fn next_sse_server_message(
    response: reqwest::Response,
) -> Result<ServerMessage, GatewayError> {
    let mut stream = response.bytes_stream();
    let mut buffer = SseLineBuffer::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| GatewayError::Transport(err.to_string()))?;
        for line in buffer.push(&chunk) {
            if let Some(message) = take_terminal_message(&line)? {
                return Ok(message);
            }
        }
    }

    for line in buffer.finish() {
        if let Some(message) = take_terminal_message(&line)? {
            return Ok(message);
        }
    }

    Err(GatewayError::Protocol(
        "Empty event-stream response.".to_string(),
    ))
}

fn take_terminal_message(line: &str) -> Result<Option<ServerMessage>, GatewayError> {
    let Some(message) = decode_sse_line(line)? else {
        return Ok(None);
    };
    if matches!(
        message,
        ServerMessage::Response(_) | ServerMessage::Error(_)
    ) {
        return Ok(Some(message));
    }
    trace!(?message, "Skipping interleaved MCP server message");
    Ok(None)
}

fn decode_sse_line(line: &str) -> Result<Option<ServerMessage>, GatewayError> {
    let Some(payload) = sse_data_payload(line) else {
        return Ok(None);
    };

    if payload.is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<ServerMessage>(payload)
        .map(Some)
        .map_err(|err| GatewayError::Protocol(err.to_string()))
}
