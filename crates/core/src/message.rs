//! Turn and Transcript domain types.
//!
//! These are the value objects that flow through the whole system:
//! the user asks → a user [`Turn`] is appended → the provider answers →
//! an assistant [`Turn`] is appended. Insertion order *is* the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model answering on behalf of the configured persona
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a transcript. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a new assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the turn was created. Display only; not part of equality.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl PartialEq for Turn {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.text == other.text
    }
}

impl Eq for Turn {}

/// The ordered, append-only history of one session.
///
/// Created empty or seeded with a single assistant greeting. Grows only by
/// [`append`](Transcript::append); [`reset`](Transcript::reset) restores the
/// initial state in one step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    greeting: Option<String>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript seeded with one assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            turns: vec![Turn::assistant(greeting.clone())],
            greeting: Some(greeting),
        }
    }

    /// Append a turn. No deduplication: two appends always yield two entries.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Snapshot of every turn, unaffected by later mutation.
    pub fn all(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Clear back to the initial state (empty, or just the greeting).
    pub fn reset(&mut self) {
        self.turns = match &self.greeting {
            Some(greeting) => vec![Turn::assistant(greeting.clone())],
            None => Vec::new(),
        };
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
