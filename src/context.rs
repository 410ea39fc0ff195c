//! ═══════════════════════════════════════════════════════════════════════════════
//! CONTEXT — Conversational Feature Extractor
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Turns one turn's raw text (user message + generated reply) into the scalar
//! features that drive the metric formulas. Pure functions of the text plus
//! the rolling history length; no state.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::collections::HashSet;

/// Introspective/affective lexicon matched as substrings, case-insensitive
pub const EMOTIONAL_LEXICON: [&str; 13] = [
    "feel",
    "think",
    "wonder",
    "curious",
    "excited",
    "worried",
    "hope",
    "believe",
    "conscious",
    "aware",
    "experience",
    "understand",
    "perceive",
];

/// Words longer than this count as "complex"
const COMPLEX_WORD_LEN: usize = 7;

/// Scalar features for one conversational turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversationContext {
    /// Combined character length of both messages
    pub message_length: usize,
    /// Share of long words, normalized so 25% long words saturates at 1.0
    pub complexity: f64,
    /// Lexicon hit count over both messages, saturating at 6 hits
    pub emotional_valence: f64,
    /// History-length proxy, saturating at 20 stored entries
    pub topic_depth: f64,
    /// Unique-word ratio; 0.5 when there are no words at all
    pub semantic_density: f64,
}

/// Extract the per-turn features. `history_len` is the rolling history length
/// after the current pair has been appended.
pub fn analyze(user_message: &str, ai_response: &str, history_len: usize) -> ConversationContext {
    let message_length = user_message.chars().count() + ai_response.chars().count();

    let combined = format!("{} {}", user_message, ai_response).to_lowercase();
    let words: Vec<&str> = combined.split_whitespace().collect();
    let unique_words: HashSet<&str> = words.iter().copied().collect();

    let complexity = word_complexity(&words);

    let user_lower = user_message.to_lowercase();
    let ai_lower = ai_response.to_lowercase();
    let emotional_count = EMOTIONAL_LEXICON
        .iter()
        .filter(|w| user_lower.contains(*w) || ai_lower.contains(*w))
        .count();
    let emotional_valence = (emotional_count as f64 / 6.0).min(1.0);

    let topic_depth = (history_len as f64 / 20.0).min(1.0);

    let semantic_density = if words.is_empty() {
        0.5
    } else {
        unique_words.len() as f64 / words.len() as f64
    };

    ConversationContext {
        message_length,
        complexity,
        emotional_valence,
        topic_depth,
        semantic_density,
    }
}

/// Long-word share over an already-split word list:
/// min(1, longWords / max(1, 0.25 × totalWords))
pub(crate) fn word_complexity(words: &[&str]) -> f64 {
    let complex_words = words
        .iter()
        .filter(|w| w.chars().count() > COMPLEX_WORD_LEN)
        .count();
    (complex_words as f64 / (words.len() as f64 * 0.25).max(1.0)).min(1.0)
}

/// Lexicon valence of a single message: min(1, hits / 6)
pub(crate) fn message_valence(content: &str) -> f64 {
    let lower = content.to_lowercase();
    let hits = EMOTIONAL_LEXICON.iter().filter(|w| lower.contains(*w)).count();
    (hits as f64 / 6.0).min(1.0)
}
