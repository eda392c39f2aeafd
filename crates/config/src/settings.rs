//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::endpoints;
use crate::{AgentConfig, ConfigError, ExtractionScope, VocabularyConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation, warnings only
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation limits and extraction scope
    #[serde(default)]
    pub agent: AgentConfig,

    /// Reply generator (Claude)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Outbound call provider
    #[serde(default)]
    pub call: CallConfig,

    /// Lead store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Extraction keyword lists
    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Path to a listings YAML file; built-in catalog when unset
    #[serde(default)]
    pub catalog_path: Option<String>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_agent()?;
        self.validate_providers()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.auth.enabled
            && server
                .auth
                .api_key
                .as_deref()
                .map(str::is_empty)
                .unwrap_or(true)
        {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.api_key".to_string(),
                message: "API key is required when authentication is enabled".to_string(),
            });
        }

        if self.environment.is_production() && !server.auth.enabled {
            tracing::warn!("Authentication is disabled in production");
        }

        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;

        if agent.max_messages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_messages".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if agent.call_prompt_threshold == 0 || agent.call_prompt_threshold > agent.max_messages {
            return Err(ConfigError::InvalidValue {
                field: "agent.call_prompt_threshold".to_string(),
                message: format!(
                    "Must be between 1 and max_messages ({}), got {}",
                    agent.max_messages, agent.call_prompt_threshold
                ),
            });
        }

        if let ExtractionScope::RecentWindow { messages } = agent.extraction {
            if messages == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "agent.extraction.messages".to_string(),
                    message: "Recent window must cover at least 1 message".to_string(),
                });
            }
        }

        if agent.max_listing_results == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_listing_results".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Network providers need their credentials; missing keys are fatal only in strict
    /// environments, otherwise the service falls back to offline collaborators.
    fn validate_providers(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();

        if self.call.provider == CallProvider::ElevenLabs {
            if self.call.api_key.is_none() {
                missing.push("call.api_key");
            }
            if self.call.agent_id.is_none() {
                missing.push("call.agent_id");
            }
        }

        if self.store.backend == StoreBackend::Supabase {
            if self.store.url.is_none() {
                missing.push("store.url");
            }
            if self.store.api_key.is_none() {
                missing.push("store.api_key");
            }
        }

        if self.llm.api_key.is_none() {
            missing.push("llm.api_key");
        }

        if missing.is_empty() {
            return Ok(());
        }

        if self.environment.is_strict() {
            return Err(ConfigError::MissingField(missing.join(", ")));
        }

        tracing::warn!(
            missing = %missing.join(", "),
            "Provider credentials missing, offline fallbacks will be used"
        );
        Ok(())
    }
}

// =============================================================================
// Server
// =============================================================================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means localhost only
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enable authentication (disabled for development)
    #[serde(default)]
    pub enabled: bool,

    /// Bearer API key (set via ROY__SERVER__AUTH__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Paths that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/ready".to_string(),
        "/metrics".to_string(),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            public_paths: default_public_paths(),
        }
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// Claude reply generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_anthropic_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_claude_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_collaborator_timeout")]
    pub timeout_secs: u64,

    /// Falls back to ANTHROPIC_API_KEY
    #[serde(default = "default_anthropic_key")]
    pub api_key: Option<String>,
}

fn default_anthropic_endpoint() -> String {
    endpoints::ANTHROPIC_DEFAULT.to_string()
}
fn default_claude_model() -> String {
    endpoints::CLAUDE_MODEL_DEFAULT.to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f32 {
    0.7
}
fn default_collaborator_timeout() -> u64 {
    30
}
fn default_anthropic_key() -> Option<String> {
    env_secret("ANTHROPIC_API_KEY")
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_anthropic_endpoint(),
            model: default_claude_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_collaborator_timeout(),
            api_key: default_anthropic_key(),
        }
    }
}

/// Outbound call provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallProvider {
    /// Logs the call and returns a synthetic id
    #[default]
    Stub,
    #[serde(alias = "eleven_labs")]
    ElevenLabs,
}

/// Call trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    #[serde(default)]
    pub provider: CallProvider,

    #[serde(default = "default_elevenlabs_endpoint")]
    pub endpoint: String,

    /// Falls back to ELEVENLABS_API_KEY
    #[serde(default = "default_elevenlabs_key")]
    pub api_key: Option<String>,

    /// Falls back to ELEVENLABS_AGENT_ID
    #[serde(default = "default_elevenlabs_agent")]
    pub agent_id: Option<String>,

    #[serde(default = "default_collaborator_timeout")]
    pub timeout_secs: u64,
}

fn default_elevenlabs_endpoint() -> String {
    endpoints::ELEVENLABS_DEFAULT.to_string()
}
fn default_elevenlabs_key() -> Option<String> {
    env_secret("ELEVENLABS_API_KEY")
}
fn default_elevenlabs_agent() -> Option<String> {
    env_secret("ELEVENLABS_AGENT_ID")
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            provider: CallProvider::default(),
            endpoint: default_elevenlabs_endpoint(),
            api_key: default_elevenlabs_key(),
            agent_id: default_elevenlabs_agent(),
            timeout_secs: default_collaborator_timeout(),
        }
    }
}

/// Lead store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map, lost on restart
    #[default]
    Memory,
    /// Supabase PostgREST table
    Supabase,
}

/// Lead store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Project URL; falls back to SUPABASE_URL
    #[serde(default = "default_supabase_url")]
    pub url: Option<String>,

    /// Falls back to SUPABASE_ANON_KEY
    #[serde(default = "default_supabase_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_leads_table")]
    pub table: String,

    #[serde(default = "default_collaborator_timeout")]
    pub timeout_secs: u64,
}

fn default_supabase_url() -> Option<String> {
    env_secret("SUPABASE_URL")
}
fn default_supabase_key() -> Option<String> {
    env_secret("SUPABASE_ANON_KEY")
}
fn default_leads_table() -> String {
    "leads".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_supabase_url(),
            api_key: default_supabase_key(),
            table: default_leads_table(),
            timeout_secs: default_collaborator_timeout(),
        }
    }
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Observability
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and serve /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("ROY")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.agent.max_messages, 40);
        assert_eq!(settings.call.provider, CallProvider::Stub);
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.llm.model, "claude-3-5-sonnet-20241022");
        assert_eq!(settings.llm.max_tokens, 1000);
    }

    #[test]
    fn test_agent_validation() {
        let mut settings = Settings::default();
        settings.agent.call_prompt_threshold = 50;
        assert!(settings.validate_agent().is_err());

        settings.agent.call_prompt_threshold = 30;
        assert!(settings.validate_agent().is_ok());

        settings.agent.extraction = ExtractionScope::RecentWindow { messages: 0 };
        assert!(settings.validate_agent().is_err());
    }

    #[test]
    fn test_server_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate_server().is_err());

        settings.server.port = 9000;
        settings.server.auth.enabled = true;
        assert!(settings.validate_server().is_err());

        settings.server.auth.api_key = Some("secret".to_string());
        assert!(settings.validate_server().is_ok());
    }

    #[test]
    fn test_missing_credentials_strict_only() {
        let mut settings = Settings::default();
        settings.store.backend = StoreBackend::Supabase;
        settings.store.url = None;
        assert!(settings.validate_providers().is_ok());

        settings.environment = RuntimeEnvironment::Production;
        assert!(matches!(
            settings.validate_providers(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_yaml_section_overrides() {
        let yaml = r#"
server:
  port: 9100
agent:
  max_messages: 20
  call_prompt_threshold: 15
  extraction:
    mode: recent_window
    messages: 6
call:
  provider: elevenlabs
  agent_id: agent-123
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.agent.max_messages, 20);
        assert_eq!(settings.agent.extraction, ExtractionScope::RecentWindow { messages: 6 });
        assert_eq!(settings.call.provider, CallProvider::ElevenLabs);
        assert_eq!(settings.call.agent_id.as_deref(), Some("agent-123"));
        assert_eq!(settings.agent.lead_form_min_messages, 15);
    }
}
