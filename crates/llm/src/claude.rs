//! Claude Reply Generator
//!
//! Calls the Anthropic Messages API (`POST {endpoint}/v1/messages`) with Roy's prompt and the
//! chat so far, then splits the text answer into reply fragments.
//!
//! The transcript opens with Roy's welcome, but the API requires the first message to come
//! from the user. The prompt is therefore sent as the opening user turn, followed by the
//! transcript with consecutive same-role messages merged.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use roy_config::constants::endpoints;
use roy_config::LlmConfig;
use roy_core::{LeadRecord, Replies, ReplyGenerator, Role, Transcript};

use crate::prompt::RoyPrompt;
use crate::splitter::split_reply;
use crate::LlmError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the Claude backend
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: endpoints::CLAUDE_MODEL_DEFAULT.to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            endpoint: endpoints::ANTHROPIC_DEFAULT.to_string(),
        }
    }
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build from the `llm` settings section
    pub fn from_settings(settings: &LlmConfig) -> Self {
        Self {
            api_key: settings.api_key.clone().unwrap_or_default(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }
}

/// Reply generator backed by Claude
pub struct ClaudeReplyGenerator {
    config: ClaudeConfig,
    prompt: RoyPrompt,
    client: Client,
}

impl ClaudeReplyGenerator {
    pub fn new(config: ClaudeConfig, prompt: RoyPrompt) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            config,
            prompt,
            client,
        })
    }

    fn build_request(
        &self,
        transcript: &Transcript,
        known: &LeadRecord,
        message_count: usize,
    ) -> ClaudeRequest {
        let mut messages = vec![ClaudeMessage {
            role: "user".to_string(),
            content: self.prompt.render(known, message_count),
        }];

        for message in transcript.iter() {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            match messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&message.content);
                },
                _ => messages.push(ClaudeMessage {
                    role: role.to_string(),
                    content: message.content.clone(),
                }),
            }
        }

        ClaudeRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages,
            temperature: Some(self.config.temperature),
        }
    }

    /// One Messages API round trip, returning the concatenated text blocks
    pub async fn complete(
        &self,
        transcript: &Transcript,
        known: &LeadRecord,
        message_count: usize,
    ) -> Result<String, LlmError> {
        let request = self.build_request(transcript, known, message_count);
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: ClaudeApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            model = %self.config.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Claude reply received"
        );

        Ok(response.text())
    }
}

#[async_trait]
impl ReplyGenerator for ClaudeReplyGenerator {
    async fn generate(
        &self,
        transcript: &Transcript,
        known: &LeadRecord,
        message_count: usize,
    ) -> roy_core::Result<Replies> {
        let text = self.complete(transcript, known, message_count).await?;
        Replies::from_fragments(split_reply(&text))
            .ok_or_else(|| LlmError::InvalidResponse("empty reply".to_string()).into())
    }

    fn name(&self) -> &str {
        "claude"
    }
}

// =============================================================================
// Claude API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContentBlock>,
    #[serde(default)]
    stop_reason: ClaudeStopReason,
    usage: ClaudeUsage,
}

impl ClaudeApiResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text.as_str()),
                ClaudeContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClaudeStopReason {
    #[default]
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use roy_core::Message;

    fn generator() -> ClaudeReplyGenerator {
        ClaudeReplyGenerator::new(ClaudeConfig::new("test-key"), RoyPrompt::default()).unwrap()
    }

    #[test]
    fn test_missing_api_key() {
        let config = ClaudeConfig {
            api_key: String::new(),
            ..ClaudeConfig::new("x")
        };
        assert!(matches!(
            ClaudeReplyGenerator::new(config, RoyPrompt::default()),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_settings() {
        let settings = LlmConfig {
            endpoint: "http://localhost:9000/".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let config = ClaudeConfig::from_settings(&settings);
        assert_eq!(config.endpoint, "http://localhost:9000");
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_request_starts_with_user_prompt_and_alternates() {
        let transcript = Transcript::from(vec![
            Message::assistant("Hey there!"),
            Message::user("I'm Bob"),
            Message::assistant("Hi Bob!"),
            Message::assistant("Renting or buying?"),
            Message::user("renting"),
        ]);
        let request = generator().build_request(&transcript, &LeadRecord::new(), 5);

        let roles: Vec<&str> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user", "assistant", "user"]);
        assert!(request.messages[0].content.contains("Current message count: 5/40"));
        assert_eq!(request.messages[3].content, "Hi Bob!\n\nRenting or buying?");
        assert_eq!(request.model, "claude-3-5-sonnet-20241022");
        assert_eq!(request.max_tokens, 1000);
    }

    #[test]
    fn test_request_serialization() {
        let request = generator().build_request(&Transcript::new(), &LeadRecord::new(), 1);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "id": "msg_01",
            "content": [
                {"type": "text", "text": "Perfect! "},
                {"type": "text", "text": "What's your email?"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 812, "output_tokens": 9}
        }"#;

        let response: ClaudeApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.stop_reason, ClaudeStopReason::EndTurn);
        assert_eq!(response.usage.output_tokens, 9);
        assert_eq!(response.text(), "Perfect! What's your email?");
    }

    #[test]
    fn test_unknown_blocks_ignored() {
        let json = r#"{
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Got it!"}
            ],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;

        let response: ClaudeApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.stop_reason, ClaudeStopReason::MaxTokens);
        assert_eq!(response.text(), "Got it!");
    }
}
