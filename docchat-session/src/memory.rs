//! Append-only conversation memory for one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// The question as the user asked it.
    pub question: String,
    /// The generated answer, without the source listing.
    pub answer: String,
    /// When the turn was recorded.
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into(), created_at: Utc::now() }
    }
}

/// Ordered log of the turns of one session.
///
/// Turns can only be appended; the log lives as long as its session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    /// Create an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a turn after all earlier ones.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// All turns, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The last `window` turns, or all of them when `window` is `None`.
    pub fn recent(&self, window: Option<usize>) -> &[ConversationTurn] {
        match window {
            Some(n) => &self.turns[self.turns.len().saturating_sub(n)..],
            None => &self.turns,
        }
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
