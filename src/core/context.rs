//! Builds the single prompt blob sent to the language model.

use crate::core::message::ConversationTurn;
use crate::core::search::ToolInvocation;

/// Appended once, after all result blocks, when any search ran this turn.
pub const SEARCH_INSTRUCTION: &str =
    "assistant: Based on the above search results, answer the user's last question.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAssembler {
    history_window: usize,
}

impl ContextAssembler {
    /// The window counts the current question as one of its turns, so a
    /// window of `n` carries at most `n - 1` earlier turns. Config loading
    /// rejects zero; a zero passed here directly is raised to one.
    pub fn new(history_window: usize) -> Self {
        Self {
            history_window: history_window.max(1),
        }
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Layout: the last `history_window` turns as `role: text` lines, then
    /// one block per invocation in dispatch order, then the instruction line
    /// if there was at least one invocation.
    pub fn assemble(&self, history: &[ConversationTurn], invocations: &[ToolInvocation]) -> String {
        let start = history.len().saturating_sub(self.history_window);
        let mut context = String::new();
        for turn in &history[start..] {
            context.push_str(turn.role.as_str());
            context.push_str(": ");
            context.push_str(&turn.text);
            context.push('\n');
        }

        for invocation in invocations {
            context.push_str(&format!(
                "assistant: Here are results from a search tool for the topic '{}':\n\n{}\n\n",
                invocation.topic, invocation.text
            ));
        }

        if !invocations.is_empty() {
            context.push_str(SEARCH_INSTRUCTION);
        }
        context
    }
}
