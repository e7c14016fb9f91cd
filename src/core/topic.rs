//! Topic extraction from free-form user utterances.
//!
//! A search is requested when the utterance contains the trigger word
//! followed, somewhere later, by one of a mode's terminator phrases. The
//! topic is whatever sits between the two.

use crate::core::search::SearchMode;

pub const TRIGGER_WORD: &str = "search";

const TOPIC_TRIM_CHARS: [char; 6] = [' ', ':', ',', '-', '\n', '\t'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub mode: SearchMode,
    pub topic: String,
}

/// Returns the topic for `mode`, or `None` when the utterance does not ask
/// for that kind of search.
///
/// Matching is case-insensitive and substring-based: "research" contains the
/// trigger. Only the first trigger occurrence is considered, and the first
/// terminator in the mode's declaration order that appears after it ends the
/// topic. The returned slice keeps the user's original casing.
pub fn extract_topic(utterance: &str, mode: SearchMode) -> Option<String> {
    // ASCII folding keeps byte offsets aligned with the original text.
    let folded = utterance.to_ascii_lowercase();
    let start = folded.find(TRIGGER_WORD)? + TRIGGER_WORD.len();

    let end = mode.spec().terminators.iter().find_map(|phrase| {
        folded
            .match_indices(phrase)
            .map(|(position, _)| position)
            .find(|&position| position > start)
    })?;

    let topic = utterance[start..end]
        .trim_matches(|c: char| c.is_whitespace() || TOPIC_TRIM_CHARS.contains(&c));
    if topic.is_empty() {
        None
    } else {
        Some(topic.to_string())
    }
}

/// Every search the utterance asks for, in dispatch order.
pub fn detect_search_requests(utterance: &str) -> Vec<SearchRequest> {
    SearchMode::ALL
        .iter()
        .filter_map(|&mode| {
            extract_topic(utterance, mode).map(|topic| SearchRequest { mode, topic })
        })
        .collect()
}
