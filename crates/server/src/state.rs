//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use roy_agent::Collaborators;
use roy_config::{AgentConfig, ListingCatalog, Settings};
use roy_core::{CallTrigger, LeadStore, ReplyGenerator};
use roy_llm::{ClaudeConfig, ClaudeReplyGenerator, RoyPrompt, ScriptedReplyGenerator};
use roy_persistence::InMemoryLeadStore;
use roy_text_processing::LeadExtractor;
use roy_tools::StubCallTrigger;

use crate::registry::SessionRegistry;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionRegistry>,
    pub collaborators: Collaborators,
    pub extractor: Arc<LeadExtractor>,
    pub catalog: Arc<ListingCatalog>,
    /// Set once the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State with explicit collaborators
    pub fn new(settings: Settings, collaborators: Collaborators) -> Result<Self, ServerError> {
        let catalog = load_catalog(&settings)?;
        Self::assemble(settings, catalog, collaborators)
    }

    /// State with collaborators built from settings
    ///
    /// Outside strict environments a collaborator that cannot be configured is replaced by
    /// its offline counterpart.
    pub fn from_settings(settings: Settings) -> Result<Self, ServerError> {
        let catalog = load_catalog(&settings)?;
        let collaborators = build_collaborators(&settings, &catalog)?;
        Self::assemble(settings, catalog, collaborators)
    }

    fn assemble(
        settings: Settings,
        catalog: ListingCatalog,
        collaborators: Collaborators,
    ) -> Result<Self, ServerError> {
        let extractor = roy_agent::build_extractor(&settings.agent, &settings.vocabulary)?;
        Ok(Self {
            settings: Arc::new(settings),
            sessions: Arc::new(SessionRegistry::new()),
            collaborators,
            extractor: Arc::new(extractor),
            catalog: Arc::new(catalog),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.settings.agent
    }
}

fn load_catalog(settings: &Settings) -> Result<ListingCatalog, ServerError> {
    ListingCatalog::load(settings.catalog_path.as_deref())
        .map_err(|e| ServerError::Internal(format!("listing catalog: {}", e)))
}

/// Roy's prompt for the configured limits and catalog
pub fn build_prompt(settings: &Settings, catalog: &ListingCatalog) -> RoyPrompt {
    RoyPrompt::new(
        settings.agent.name.clone(),
        settings.agent.max_messages,
        settings.agent.call_prompt_threshold,
    )
    .with_listings(catalog.listings().to_vec())
}

fn build_collaborators(
    settings: &Settings,
    catalog: &ListingCatalog,
) -> Result<Collaborators, ServerError> {
    let strict = settings.environment.is_strict();
    let prompt = build_prompt(settings, catalog);

    let replies: Arc<dyn ReplyGenerator> =
        match ClaudeReplyGenerator::new(ClaudeConfig::from_settings(&settings.llm), prompt.clone()) {
            Ok(claude) => Arc::new(claude),
            Err(e) if !strict => {
                tracing::warn!(error = %e, "Claude unavailable, using offline replies");
                Arc::new(ScriptedReplyGenerator::offline())
            },
            Err(e) => return Err(ServerError::Internal(e.to_string())),
        };

    let calls: Arc<dyn CallTrigger> =
        match roy_tools::create_call_trigger(&settings.call, Some(prompt.persona())) {
            Ok(trigger) => trigger,
            Err(e) if !strict => {
                tracing::warn!(error = %e, "Call provider unavailable, using stub");
                Arc::new(StubCallTrigger::new())
            },
            Err(e) => return Err(ServerError::Internal(e.to_string())),
        };

    let store: Arc<dyn LeadStore> = match roy_persistence::init(&settings.store) {
        Ok(store) => store,
        Err(e) if !strict => {
            tracing::warn!(error = %e, "Lead store unavailable, using in-memory store");
            Arc::new(InMemoryLeadStore::new())
        },
        Err(e) => return Err(ServerError::Internal(e.to_string())),
    };

    tracing::info!(
        replies = replies.name(),
        calls = calls.name(),
        store = store.name(),
        "Collaborators configured"
    );

    Ok(Collaborators {
        replies,
        store,
        calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_settings() {
        let mut settings = Settings::default();
        settings.llm.api_key = None;
        let state = AppState::from_settings(settings).unwrap();
        assert_eq!(state.collaborators.replies.name(), "scripted");
        assert_eq!(state.collaborators.calls.name(), "stub");
        assert_eq!(state.collaborators.store.name(), "memory");
        assert_eq!(state.catalog.len(), 10);
        assert_eq!(state.sessions.count(), 0);
    }
}
