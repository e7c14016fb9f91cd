use async_trait::async_trait;
use futures_util::StreamExt;
use memchr::memchr;
use std::fmt;
use tracing::{debug, warn};

use crate::api::{ChatCompletion, ChatMessage, ChatRequest, ChatResponse};
use crate::core::config::Config;
use crate::utils::url::construct_api_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    Unconfigured { setting: &'static str },
    Http(String),
    /// Error reported by the server, already formatted for display.
    Api(String),
    Stream(String),
    Empty,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Unconfigured { setting } => {
                write!(f, "{setting} is not set; the language model is unavailable")
            }
            ModelError::Http(message) => write!(f, "Request to language model failed: {message}"),
            ModelError::Api(message) => f.write_str(message),
            ModelError::Stream(message) => write!(f, "Language model stream failed: {message}"),
            ModelError::Empty => f.write_str("Language model returned an empty reply"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Turns one assembled prompt into one reply.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    Chunk(String),
    Done,
    Error(String),
    Skip,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(payload: &str) -> StreamEvent {
    if payload == "[DONE]" {
        return StreamEvent::Done;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .map(StreamEvent::Chunk)
            .unwrap_or(StreamEvent::Skip),
        Err(_) => {
            if payload.trim().is_empty() {
                return StreamEvent::Skip;
            }
            StreamEvent::Error(format_api_error(payload))
        }
    }
}

fn process_sse_line(line: &str) -> StreamEvent {
    extract_data_payload(line)
        .map(handle_data_payload)
        .unwrap_or(StreamEvent::Skip)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                serde_json::Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{}\n```", trimmed)
    } else {
        format!("API Error:\n```\n{}\n```", trimmed)
    }
}

/// OpenAI-compatible `/chat/completions` client. The prompt is sent as a
/// single user message and the streamed reply is collected in full.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        client: reqwest::Client,
        base_url: Option<String>,
        model: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            model,
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            reqwest::Client::new(),
            config.base_url().map(str::to_string),
            config.model().map(str::to_string),
            config.api_key().map(str::to_string),
        )
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(ModelError::Unconfigured { setting: "BASE_URL" })?;
        let model = self
            .model
            .as_deref()
            .ok_or(ModelError::Unconfigured {
                setting: "MODEL_NAME",
            })?;

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: true,
        };

        let chat_url = construct_api_url(base_url, "chat/completions");
        debug!(
            url = %chat_url,
            model,
            prompt_chars = prompt.chars().count(),
            "Requesting completion"
        );
        let mut http_request = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .json(&request)
            .send()
            .await
            .map_err(|err| ModelError::Http(err.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ModelError::Api(format_api_error(&error_text)));
        }

        if is_json_response(&response) {
            let completion = response
                .json::<ChatCompletion>()
                .await
                .map_err(|err| ModelError::Stream(err.to_string()))?;
            let reply = completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default();
            return non_empty(reply);
        }

        non_empty(read_streamed_reply(response).await?)
    }
}

fn non_empty(reply: String) -> Result<String, ModelError> {
    if reply.trim().is_empty() {
        Err(ModelError::Empty)
    } else {
        Ok(reply)
    }
}

fn is_json_response(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

async fn read_streamed_reply(response: reqwest::Response) -> Result<String, ModelError> {
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut reply = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| ModelError::Stream(err.to_string()))?;
        buffer.extend_from_slice(&chunk);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let finished = apply_stream_line(&buffer[..newline_pos], &mut reply)?;
            buffer.drain(..=newline_pos);
            if finished {
                return Ok(reply);
            }
        }
    }

    if !buffer.is_empty() {
        apply_stream_line(&buffer, &mut reply)?;
    }
    Ok(reply)
}

/// Returns `true` once the terminating `[DONE]` frame is seen.
fn apply_stream_line(line: &[u8], reply: &mut String) -> Result<bool, ModelError> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(err) => {
            warn!("Invalid UTF-8 in stream: {err}");
            return Ok(false);
        }
    };

    match process_sse_line(line) {
        StreamEvent::Chunk(content) => {
            reply.push_str(&content);
            Ok(false)
        }
        StreamEvent::Done => Ok(true),
        StreamEvent::Error(message) => Err(ModelError::Api(message)),
        StreamEvent::Skip => Ok(false),
    }
}
