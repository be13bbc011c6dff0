//! Conversation turns and the per-session log

use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Wire name used by the generative API
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Ordered log of prior turns for one session
///
/// Turns are only ever added in committed question/answer pairs; the log is
/// bounded by `max_turns` and drops the oldest turns first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    #[serde(skip)]
    max_turns: Option<usize>,
}

impl ConversationLog {
    /// Create an unbounded log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that keeps at most `max_turns` turns (0 = unbounded)
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_turns: (max_turns > 0).then_some(max_turns),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The log followed by one extra turn, without touching the log
    pub fn with_pending(&self, pending: Turn) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.extend(self.turns.iter().cloned());
        turns.push(pending);
        turns
    }

    /// Append a completed exchange
    pub fn commit_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn::user(question));
        self.turns.push(Turn::model(answer));
        self.trim();
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn trim(&mut self) {
        let Some(max) = self.max_turns else {
            return;
        };
        if self.turns.len() > max {
            // Whole exchanges only; never keep half a question/answer pair
            let excess = self.turns.len() - max;
            let excess = (excess + excess % 2).min(self.turns.len());
            self.turns.drain(..excess);
        }
        // A history must not open with a model reply
        while self.turns.first().is_some_and(|t| t.role == Role::Model) {
            self.turns.remove(0);
        }
    }
}
