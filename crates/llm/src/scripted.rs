//! Scripted reply generator
//!
//! Cycles through a fixed list of replies. Used for offline runs (no API key) and tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use roy_core::{LeadField, LeadRecord, Replies, ReplyGenerator, Transcript};

use crate::splitter::split_reply;

/// Generator that replays canned replies in order, wrapping around at the end
pub struct ScriptedReplyGenerator {
    script: Vec<String>,
    cursor: Mutex<usize>,
}

impl ScriptedReplyGenerator {
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script: Vec<String> = script
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.trim().is_empty())
            .collect();
        Self {
            script,
            cursor: Mutex::new(0),
        }
    }

    /// Offline generator that asks for the first missing lead field
    pub fn offline() -> Self {
        Self::new(Vec::<String>::new())
    }

    fn question_for(known: &LeadRecord) -> String {
        let question = match known.missing_fields().first() {
            Some(LeadField::Name) => "What's your name?",
            Some(LeadField::Email) => "What's the best email to send you listings?",
            Some(LeadField::Phone) => "What's the best number to reach you?",
            Some(LeadField::RentOrBuy) => "Are you looking to rent or buy?",
            Some(LeadField::Area) => "Which area or neighbourhood are you interested in?",
            Some(LeadField::Amenities) => "Which amenities matter most to you?",
            Some(LeadField::BudgetRange) => "What's your budget range?",
            Some(LeadField::Urgency) => "How soon are you hoping to move?",
            None => "I have everything I need. Would you like me to give you a call?",
        };
        format!("Got it! {}", question)
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedReplyGenerator {
    async fn generate(
        &self,
        _transcript: &Transcript,
        known: &LeadRecord,
        _message_count: usize,
    ) -> roy_core::Result<Replies> {
        let reply = if self.script.is_empty() {
            Self::question_for(known)
        } else {
            let mut cursor = self.cursor.lock();
            let reply = self.script[*cursor % self.script.len()].clone();
            *cursor += 1;
            reply
        };
        Ok(Replies::from_fragments(split_reply(&reply)).unwrap_or_else(|| Replies::single(reply)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cycles_through_script() {
        let generator = ScriptedReplyGenerator::new(["first", "second"]);
        let transcript = Transcript::new();
        let known = LeadRecord::new();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let replies = generator.generate(&transcript, &known, 1).await.unwrap();
            seen.push(replies.first().to_string());
        }
        assert_eq!(seen, vec!["first", "second", "first"]);
    }

    #[tokio::test]
    async fn test_offline_asks_for_missing_field() {
        let generator = ScriptedReplyGenerator::offline();
        let known = LeadRecord::new().with_name("Bob");
        let replies = generator
            .generate(&Transcript::new(), &known, 3)
            .await
            .unwrap();
        assert_eq!(replies.first(), "Got it! What's the best email to send you listings?");
    }
}
