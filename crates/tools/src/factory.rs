//! Call trigger factory
//!
//! Picks the call trigger implementation named by `call.provider`.

use std::sync::Arc;

use roy_config::{CallConfig, CallProvider};
use roy_core::CallTrigger;

use crate::integrations::{
    ElevenLabsCallTrigger, ElevenLabsConfig, IntegrationError, StubCallTrigger,
};

/// Build the configured call trigger
///
/// `preamble` is the persona text placed at the top of the voice agent's context.
pub fn create_call_trigger(
    config: &CallConfig,
    preamble: Option<String>,
) -> Result<Arc<dyn CallTrigger>, IntegrationError> {
    match config.provider {
        CallProvider::Stub => {
            tracing::info!("Using stub call trigger");
            Ok(Arc::new(StubCallTrigger::new()))
        },
        CallProvider::ElevenLabs => {
            let mut eleven = ElevenLabsConfig::from_settings(config)?;
            if let Some(preamble) = preamble {
                eleven = eleven.with_preamble(preamble);
            }
            tracing::info!(endpoint = %eleven.endpoint, "Using ElevenLabs call trigger");
            Ok(Arc::new(ElevenLabsCallTrigger::new(eleven)?))
        },
    }
}
