//! Chat messages and the ordered transcript they form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Website visitor
    User,
    /// Roy
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used when handing the conversation to the call agent
    pub fn speaker_label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Roy",
        }
    }

    /// Label used in visitor-facing downloads
    pub fn download_label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Roy",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat message. Immutable once appended to a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a visitor message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a Roy message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Ordered sequence of messages for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Remove the most recent message. Only used to roll back a turn that never completed.
    pub fn pop(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The last `n` messages (all of them if fewer exist)
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Number of messages sent by the visitor
    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    /// Lower-cased, space-joined content of every message
    pub fn lowercased_text(&self) -> String {
        join_lowercase(&self.messages)
    }

    /// Lower-cased, space-joined content of the last `n` messages
    pub fn lowercased_recent(&self, n: usize) -> String {
        join_lowercase(self.recent(n))
    }

    /// `role: content` lines, stored alongside the lead
    pub fn summary(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `User:` / `Roy:` lines handed to the outbound call agent
    pub fn call_summary(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.speaker_label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

fn join_lowercase(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript::from(vec![
            Message::assistant("Hey there!"),
            Message::user("I'm Bob"),
            Message::assistant("Nice to meet you, Bob."),
            Message::user("Looking to RENT in Burnaby"),
        ])
    }

    #[test]
    fn test_lowercased_text() {
        let transcript = sample();
        assert_eq!(
            transcript.lowercased_text(),
            "hey there! i'm bob nice to meet you, bob. looking to rent in burnaby"
        );
        assert_eq!(transcript.lowercased_recent(1), "looking to rent in burnaby");
    }

    #[test]
    fn test_recent_window_larger_than_transcript() {
        let transcript = sample();
        assert_eq!(transcript.recent(10).len(), 4);
        assert_eq!(transcript.recent(0).len(), 0);
    }

    #[test]
    fn test_summaries() {
        let transcript = sample();
        assert!(transcript.summary().starts_with("assistant: Hey there!\nuser: I'm Bob"));
        assert!(transcript.call_summary().starts_with("Roy: Hey there!\nUser: I'm Bob"));
        assert_eq!(transcript.user_message_count(), 2);
    }

    #[test]
    fn test_pop_rolls_back() {
        let mut transcript = sample();
        let popped = transcript.pop().unwrap();
        assert_eq!(popped.role, Role::User);
        assert_eq!(transcript.len(), 3);
    }
}
