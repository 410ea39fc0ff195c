//! ═══════════════════════════════════════════════════════════════════════════════
//! SRLC — Short-Range Linguistic Context Memory
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Summarizes recent conversation history (the last 10 stored messages) into a
//! scalar memory factor that biases the baseline integration/entropy metrics.
//! Rebuilt wholesale at engine construction or reset; never updated
//! incrementally.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::context::{message_valence, word_complexity};
use crate::state::ChatMessage;

/// How many trailing messages contribute to the averages
const RECENT_WINDOW: usize = 10;

/// Summary of recent conversational complexity and emotion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrlcMemory {
    /// Total past messages at build time
    pub message_count: usize,
    /// min(1, totalPastMessages / 30)
    pub conversation_depth: f64,
    pub average_complexity: f64,
    pub average_emotional_valence: f64,
    /// min(2.5, 1.5·depth + 0.6·avgComplexity + 0.4·avgValence)
    pub memory_factor: f64,
}

impl SrlcMemory {
    /// Empty memory for a fresh conversation
    pub fn empty() -> Self {
        Self {
            message_count: 0,
            conversation_depth: 0.0,
            average_complexity: 0.0,
            average_emotional_valence: 0.0,
            memory_factor: 0.0,
        }
    }

    /// Build from stored history. Only the trailing window feeds the
    /// averages; the depth term sees the full message count.
    pub fn from_messages(past_messages: &[ChatMessage]) -> Self {
        if past_messages.is_empty() {
            return Self::empty();
        }

        let start = past_messages.len().saturating_sub(RECENT_WINDOW);
        let recent = &past_messages[start..];

        let mut total_complexity = 0.0;
        let mut total_valence = 0.0;

        for msg in recent {
            let lower = msg.content.to_lowercase();
            let words: Vec<&str> = lower.split_whitespace().collect();
            let complexity = if words.is_empty() {
                0.0
            } else {
                word_complexity(&words)
            };
            total_complexity += complexity;
            total_valence += message_valence(&msg.content);
        }

        let average_complexity = total_complexity / recent.len() as f64;
        let average_emotional_valence = total_valence / recent.len() as f64;
        let conversation_depth = (past_messages.len() as f64 / 30.0).min(1.0);

        let memory_factor = (conversation_depth * 1.5
            + average_complexity * 0.6
            + average_emotional_valence * 0.4)
            .min(2.5);

        Self {
            message_count: past_messages.len(),
            conversation_depth,
            average_complexity,
            average_emotional_valence,
            memory_factor,
        }
    }
}
