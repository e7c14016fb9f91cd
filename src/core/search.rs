//! Search modes and the dispatcher that turns a topic into tool output.
//!
//! Each [`SearchMode`] is bound to one row of [`SEARCH_MODES`]: which gateway
//! serves it, which tool to call, and which trailing phrases end a topic.
//! Dispatch is generic over that table; there is no per-mode code path.

use crate::core::config::Config;
use crate::core::topic::SearchRequest;
use crate::mcp::client::{ToolCallRequest, ToolGateway};
use crate::mcp::error::GatewayError;
use futures_util::future::join_all;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// Appended after a result that was cut at the truncation budget.
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    Paper,
    Web,
}

/// Which of the two configured gateways serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayKind {
    Local,
    Remote,
}

#[derive(Debug)]
pub struct SearchModeSpec {
    pub mode: SearchMode,
    pub gateway: GatewayKind,
    pub tool: &'static str,
    /// Other names gateways are known to publish the same tool under.
    pub tool_synonyms: &'static [&'static str],
    /// Phrases that end a topic, most specific first. Earlier entries win
    /// even when a later one occurs further left.
    pub terminators: &'static [&'static str],
    pub source_title: &'static str,
    pub provider: &'static str,
}

pub static SEARCH_MODES: [SearchModeSpec; 2] = [
    SearchModeSpec {
        mode: SearchMode::Paper,
        gateway: GatewayKind::Remote,
        tool: "paper_search",
        tool_synonyms: &[],
        terminators: &["on hugging face", "on hf", "on the hugging face"],
        source_title: "📚 Research Sources",
        provider: "Hugging Face",
    },
    SearchModeSpec {
        mode: SearchMode::Web,
        gateway: GatewayKind::Local,
        tool: "search",
        tool_synonyms: &["duckduckgo_search", "web_search"],
        terminators: &["on the web", "on web", "on internet"],
        source_title: "🔎 Web Search Results",
        provider: "DuckDuckGo",
    },
];

impl SearchMode {
    /// Dispatch order: paper results always precede web results.
    pub const ALL: [SearchMode; 2] = [SearchMode::Paper, SearchMode::Web];

    pub fn spec(self) -> &'static SearchModeSpec {
        match self {
            SearchMode::Paper => &SEARCH_MODES[0],
            SearchMode::Web => &SEARCH_MODES[1],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Paper => "paper",
            SearchMode::Web => "web",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GatewayKind {
    /// Environment variable holding this gateway's base URL.
    pub fn env_var(self) -> &'static str {
        match self {
            GatewayKind::Local => "LOCAL_MCP_HOST",
            GatewayKind::Remote => "REMOTE_MCP_HOST",
        }
    }
}

/// Result of one search dispatch within a turn. Never outlives the turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub mode: SearchMode,
    pub topic: String,
    /// Tool text, or a sentinel when the call produced nothing usable.
    pub text: String,
    /// Set iff the text exceeded the truncation budget.
    pub truncated: bool,
    pub error: Option<GatewayError>,
}

impl ToolInvocation {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Keeps the first `budget` characters and appends [`TRUNCATION_MARKER`]
/// when the text is longer than that.
pub fn truncate_result(text: String, budget: usize) -> (String, bool) {
    match text.char_indices().nth(budget) {
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
            truncated.push_str(&text[..cut]);
            truncated.push_str(TRUNCATION_MARKER);
            (truncated, true)
        }
        None => (text, false),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayEndpoints {
    pub local: Option<String>,
    pub remote: Option<String>,
}

impl GatewayEndpoints {
    pub fn get(&self, kind: GatewayKind) -> Option<&str> {
        match kind {
            GatewayKind::Local => self.local.as_deref(),
            GatewayKind::Remote => self.remote.as_deref(),
        }
    }
}

pub struct SearchDispatcher<G> {
    gateway: G,
    endpoints: GatewayEndpoints,
    truncation_budget: usize,
    resolve_synonyms: bool,
}

impl<G: ToolGateway> SearchDispatcher<G> {
    pub fn new(gateway: G, endpoints: GatewayEndpoints, truncation_budget: usize) -> Self {
        Self {
            gateway,
            endpoints,
            truncation_budget,
            resolve_synonyms: false,
        }
    }

    pub fn from_config(gateway: G, config: &Config) -> Self {
        Self::new(gateway, config.gateway_endpoints(), config.truncation_budget())
            .with_synonym_resolution(config.resolve_tool_synonyms())
    }

    pub fn with_synonym_resolution(mut self, enabled: bool) -> Self {
        self.resolve_synonyms = enabled;
        self
    }

    pub fn truncation_budget(&self) -> usize {
        self.truncation_budget
    }

    /// Runs the mode's tool with `{query: topic}`. Failures come back as
    /// sentinel text on the invocation, never as an error.
    pub async fn dispatch(&self, mode: SearchMode, topic: &str) -> ToolInvocation {
        let spec = mode.spec();
        let outcome = match self.endpoints.get(spec.gateway) {
            None => Err(GatewayError::Unconfigured {
                setting: spec.gateway.env_var(),
            }),
            Some(endpoint) => {
                let mut arguments = Map::new();
                arguments.insert("query".to_string(), Value::String(topic.to_string()));
                let mut request = ToolCallRequest::new(endpoint, spec.tool, arguments);
                if self.resolve_synonyms {
                    request = request.with_synonyms(spec.tool_synonyms.iter().copied());
                }
                info!(%mode, topic, tool = spec.tool, "Dispatching search");
                self.gateway
                    .call_tool(&request)
                    .await
                    .map(|output| output.into_text(spec.tool))
            }
        };

        let (text, error) = match outcome {
            Ok(text) => (text, None),
            Err(err) => {
                warn!(%mode, kind = ?err.kind(), error = %err, "Search degraded to sentinel");
                (err.sentinel(spec.tool), Some(err))
            }
        };

        let (text, truncated) = truncate_result(text, self.truncation_budget);
        if truncated {
            debug!(%mode, budget = self.truncation_budget, "Truncated search result");
        }

        ToolInvocation {
            mode,
            topic: topic.to_string(),
            text,
            truncated,
            error,
        }
    }

    /// Dispatches all requests concurrently; results keep request order.
    pub async fn dispatch_all(&self, requests: &[SearchRequest]) -> Vec<ToolInvocation> {
        join_all(
            requests
                .iter()
                .map(|request| self.dispatch(request.mode, &request.topic)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::error::GatewayErrorKind;
    use crate::utils::test_utils::FakeGateway;
    use std::time::Duration;

    fn endpoints() -> GatewayEndpoints {
        GatewayEndpoints {
            local: Some("http://gateway-local:9011".to_string()),
            remote: Some("http://gateway-remote:8080".to_string()),
        }
    }

    #[test]
    fn table_binds_modes_to_gateways_and_tools() {
        assert_eq!(SearchMode::Paper.spec().mode, SearchMode::Paper);
        assert_eq!(SearchMode::Paper.spec().gateway, GatewayKind::Remote);
        assert_eq!(SearchMode::Paper.spec().tool, "paper_search");
        assert_eq!(SearchMode::Web.spec().mode, SearchMode::Web);
        assert_eq!(SearchMode::Web.spec().gateway, GatewayKind::Local);
        assert_eq!(SearchMode::Web.spec().tool, "search");
    }

    #[test]
    fn truncation_keeps_exact_prefix_and_marker() {
        let (text, truncated) = truncate_result("abcdefghij".to_string(), 4);
        assert!(truncated);
        assert_eq!(text, format!("abcd{TRUNCATION_MARKER}"));

        let (text, truncated) = truncate_result("abcd".to_string(), 4);
        assert!(!truncated);
        assert_eq!(text, "abcd");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let (text, truncated) = truncate_result("ééééé".to_string(), 5);
        assert!(!truncated);
        assert_eq!(text, "ééééé");

        let (text, truncated) = truncate_result("日本語のテキスト".to_string(), 3);
        assert!(truncated);
        assert_eq!(text, format!("日本語{TRUNCATION_MARKER}"));
    }

    #[tokio::test]
    async fn dispatch_sends_query_to_the_mode_gateway() {
        let gateway = FakeGateway::new().with_text("paper_search", "papers");
        let dispatcher = SearchDispatcher::new(gateway.clone(), endpoints(), 8000);

        let invocation = dispatcher.dispatch(SearchMode::Paper, "dolphins").await;
        assert_eq!(invocation.text, "papers");
        assert!(!invocation.truncated);
        assert!(!invocation.failed());

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].endpoint, "http://gateway-remote:8080");
        assert_eq!(calls[0].tool_name, "paper_search");
        assert_eq!(
            calls[0].arguments.get("query"),
            Some(&Value::String("dolphins".to_string()))
        );
        assert!(calls[0].synonyms.is_empty());
    }

    #[tokio::test]
    async fn long_results_are_truncated_after_retrieval() {
        let gateway = FakeGateway::new().with_text("search", &"x".repeat(25));
        let dispatcher = SearchDispatcher::new(gateway, endpoints(), 10);

        let invocation = dispatcher.dispatch(SearchMode::Web, "cats").await;
        assert!(invocation.truncated);
        assert_eq!(invocation.text, format!("{}{TRUNCATION_MARKER}", "x".repeat(10)));
    }

    #[tokio::test]
    async fn missing_endpoint_becomes_sentinel_without_calling_gateway() {
        let gateway = FakeGateway::new();
        let dispatcher = SearchDispatcher::new(
            gateway.clone(),
            GatewayEndpoints {
                local: Some("http://gateway-local:9011".to_string()),
                remote: None,
            },
            8000,
        );

        let invocation = dispatcher.dispatch(SearchMode::Paper, "dolphins").await;
        assert_eq!(
            invocation.text,
            "[MCP] paper_search unavailable: REMOTE_MCP_HOST is not set."
        );
        assert_eq!(
            invocation.error.as_ref().map(GatewayError::kind),
            Some(GatewayErrorKind::Configuration)
        );
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_becomes_sentinel() {
        let gateway = FakeGateway::new().with_error(
            "search",
            GatewayError::Transport("connection refused".to_string()),
        );
        let dispatcher = SearchDispatcher::new(gateway, endpoints(), 8000);

        let invocation = dispatcher.dispatch(SearchMode::Web, "docker").await;
        assert_eq!(
            invocation.text,
            "[MCP] search failed: transport error: connection refused"
        );
        assert_eq!(
            invocation.error.as_ref().map(GatewayError::kind),
            Some(GatewayErrorKind::Transport)
        );
    }

    #[tokio::test]
    async fn synonyms_are_sent_only_when_enabled() {
        let gateway = FakeGateway::new().with_text("search", "hits");
        let dispatcher =
            SearchDispatcher::new(gateway.clone(), endpoints(), 8000).with_synonym_resolution(true);

        dispatcher.dispatch(SearchMode::Web, "rust").await;
        assert_eq!(
            gateway.calls()[0].synonyms,
            vec!["duckduckgo_search".to_string(), "web_search".to_string()]
        );
    }

    #[tokio::test]
    async fn dispatch_all_keeps_request_order_when_paper_is_slower() {
        let gateway = FakeGateway::new()
            .with_text("paper_search", "papers")
            .with_text("search", "pages")
            .with_delay("paper_search", Duration::from_millis(50));
        let dispatcher = SearchDispatcher::new(gateway, endpoints(), 8000);

        let requests = vec![
            SearchRequest {
                mode: SearchMode::Paper,
                topic: "a".to_string(),
            },
            SearchRequest {
                mode: SearchMode::Web,
                topic: "b".to_string(),
            },
        ];
        let invocations = dispatcher.dispatch_all(&requests).await;
        let modes: Vec<SearchMode> = invocations.iter().map(|i| i.mode).collect();
        assert_eq!(modes, vec![SearchMode::Paper, SearchMode::Web]);
        assert_eq!(invocations[0].text, "papers");
        assert_eq!(invocations[1].text, "pages");
    }
}
