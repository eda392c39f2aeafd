//! Configuration management for the Roy lead agent
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`ROY__` prefix, `__` separator)
//! - Conventional provider env vars for secrets (`ANTHROPIC_API_KEY`, ...)
//!
//! Reference data lives next to the settings:
//! - `VocabularyConfig`: city, neighbourhood and amenity keyword lists used by extraction
//! - `ListingCatalog`: property listings, built in or loaded from YAML

pub mod agent;
pub mod catalog;
pub mod constants;
pub mod settings;
pub mod vocabulary;

pub use agent::{AgentConfig, ExtractionScope};
pub use catalog::ListingCatalog;
pub use settings::{
    load_settings, AuthConfig, CallConfig, CallProvider, LlmConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings, StoreBackend, StoreConfig,
};
pub use vocabulary::VocabularyConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
