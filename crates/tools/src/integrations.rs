//! Outbound call integrations
//!
//! `ElevenLabsCallTrigger` hands the chat to an ElevenLabs Conversational AI agent that
//! phones the visitor. `StubCallTrigger` logs the request and returns a synthetic id.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use roy_config::constants::endpoints;
use roy_config::CallConfig;
use roy_core::{CallReceipt, CallTrigger};

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        IntegrationError::ConnectionFailed(err.to_string())
    }
}

impl From<IntegrationError> for roy_core::Error {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::InvalidRequest(msg) => roy_core::Error::InvalidInput(msg),
            other => roy_core::Error::Call(other.to_string()),
        }
    }
}

/// Instructions appended after the transcript for the voice agent
pub const CALL_BRIEF: &str = "Continue the conversation naturally, focusing on:
1. Understanding their specific needs and preferences
2. Discussing available properties that match their criteria
3. Scheduling a viewing or meeting
4. Building rapport and trust

Be conversational, helpful and professional. Reference the chat conversation naturally.";

/// Default opening line of the call context
pub const DEFAULT_PREAMBLE: &str = "You are Roy, a friendly real estate agent in Vancouver.";

// ============================================================================
// ElevenLabs
// ============================================================================

/// ElevenLabs connection settings
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub endpoint: String,
    pub api_key: String,
    pub agent_id: String,
    pub timeout: Duration,
    /// Persona text placed before the transcript in the call context
    pub preamble: String,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoints::ELEVENLABS_DEFAULT.to_string(),
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            timeout: Duration::from_secs(30),
            preamble: DEFAULT_PREAMBLE.to_string(),
        }
    }

    /// Build from the `call` settings section
    pub fn from_settings(settings: &CallConfig) -> Result<Self, IntegrationError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| IntegrationError::Configuration("ELEVENLABS_API_KEY not set".into()))?;
        let agent_id = settings
            .agent_id
            .clone()
            .ok_or_else(|| IntegrationError::Configuration("ELEVENLABS_AGENT_ID not set".into()))?;
        Ok(Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_secs),
            ..Self::new(api_key, agent_id)
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ConversationRequest<'a> {
    agent_id: &'a str,
    phone_number: &'a str,
    context: String,
}

#[derive(Debug, Deserialize)]
struct ConversationResponse {
    conversation_id: String,
}

/// Call trigger backed by ElevenLabs Conversational AI
pub struct ElevenLabsCallTrigger {
    config: ElevenLabsConfig,
    client: Client,
}

impl ElevenLabsCallTrigger {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, IntegrationError> {
        if config.api_key.is_empty() || config.agent_id.is_empty() {
            return Err(IntegrationError::Configuration(
                "ElevenLabs API key and agent id are required".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Context string sent with the call
    pub fn context(&self, transcript_summary: &str) -> String {
        format!(
            "{}\n\nHere's the conversation history with this lead:\n{}\n\n{}",
            self.config.preamble, transcript_summary, CALL_BRIEF
        )
    }

    async fn start_conversation(
        &self,
        phone_number: &str,
        transcript_summary: &str,
    ) -> Result<String, IntegrationError> {
        let request = ConversationRequest {
            agent_id: &self.config.agent_id,
            phone_number,
            context: self.context(transcript_summary),
        };

        let response = self
            .client
            .post(format!("{}/v1/convai/conversation", self.config.endpoint))
            .header("xi-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => IntegrationError::AuthFailed(error_text),
                429 => IntegrationError::RateLimited,
                400 | 422 => IntegrationError::InvalidRequest(error_text),
                _ => IntegrationError::Internal(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let body: ConversationResponse = response
            .json()
            .await
            .map_err(|e| IntegrationError::Internal(format!("invalid response: {}", e)))?;
        Ok(body.conversation_id)
    }
}

#[async_trait]
impl CallTrigger for ElevenLabsCallTrigger {
    async fn initiate(
        &self,
        phone_number: &str,
        transcript_summary: &str,
    ) -> roy_core::Result<CallReceipt> {
        if phone_number.trim().is_empty() {
            return Err(IntegrationError::InvalidRequest("phone number is required".into()).into());
        }
        let call_id = self
            .start_conversation(phone_number.trim(), transcript_summary)
            .await?;
        tracing::info!(call_id = %call_id, "ElevenLabs: Conversation started");
        Ok(CallReceipt { call_id })
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

// ============================================================================
// Stub
// ============================================================================

/// Stub call trigger for development/testing
///
/// Never dials anyone; returns a synthetic id.
#[derive(Debug, Default)]
pub struct StubCallTrigger;

impl StubCallTrigger {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CallTrigger for StubCallTrigger {
    async fn initiate(
        &self,
        phone_number: &str,
        transcript_summary: &str,
    ) -> roy_core::Result<CallReceipt> {
        let call_id = format!(
            "CALL-{}",
            uuid::Uuid::new_v4().to_string()[..8].to_uppercase()
        );
        tracing::info!(
            call_id = %call_id,
            phone = %phone_number,
            summary_len = transcript_summary.len(),
            "Stub call: Initiated"
        );
        Ok(CallReceipt { call_id })
    }

    fn name(&self) -> &str {
        "stub"
    }
}
