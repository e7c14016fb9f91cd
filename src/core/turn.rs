//! One conversation turn: detect searches, dispatch them, assemble the
//! prompt, ask the model, record the reply.

use crate::core::chat_stream::{ChatCompletionsClient, LanguageModel, ModelError};
use crate::core::config::Config;
use crate::core::context::ContextAssembler;
use crate::core::conversation::Conversation;
use crate::core::search::{SearchDispatcher, ToolInvocation};
use crate::core::topic::detect_search_requests;
use crate::mcp::client::{GatewayClient, ToolGateway};
use crate::mcp::error::GatewayError;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    /// Searches run this turn, paper before web.
    pub invocations: Vec<ToolInvocation>,
}

/// Heading plus text of one search, shown after the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSection {
    pub heading: String,
    pub body: String,
}

impl TurnOutcome {
    pub fn sources(&self) -> Vec<SourceSection> {
        self.invocations
            .iter()
            .map(|invocation| {
                let spec = invocation.mode.spec();
                SourceSection {
                    heading: format!(
                        "{} ({} `{}` on '{}')",
                        spec.source_title, spec.provider, spec.tool, invocation.topic
                    ),
                    body: invocation.text.clone(),
                }
            })
            .collect()
    }
}

pub struct TurnPipeline<G, M> {
    dispatcher: SearchDispatcher<G>,
    assembler: ContextAssembler,
    model: M,
}

impl TurnPipeline<GatewayClient, ChatCompletionsClient> {
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let gateway = GatewayClient::new(
            config.gateway_timeout(),
            config.protocol_version().map(str::to_string),
        )?;
        Ok(Self::new(
            SearchDispatcher::from_config(gateway, config),
            ContextAssembler::new(config.history_window()),
            ChatCompletionsClient::from_config(config),
        ))
    }
}

impl<G: ToolGateway, M: LanguageModel> TurnPipeline<G, M> {
    pub fn new(dispatcher: SearchDispatcher<G>, assembler: ContextAssembler, model: M) -> Self {
        Self {
            dispatcher,
            assembler,
            model,
        }
    }

    /// Appends the user turn, then the reply on success. A model failure
    /// leaves the user turn in place and no assistant turn.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: &str,
    ) -> Result<TurnOutcome, ModelError> {
        conversation.push_user(input);

        let requests = detect_search_requests(input);
        if !requests.is_empty() {
            debug!(count = requests.len(), "Search requested");
        }
        let invocations = self.dispatcher.dispatch_all(&requests).await;

        let prompt = self.assembler.assemble(conversation.turns(), &invocations);
        let reply = self.model.complete(&prompt).await?;
        conversation.push_assistant(reply.clone());

        Ok(TurnOutcome { reply, invocations })
    }
}
