//! External tools for the Roy lead agent
//!
//! Outbound phone calls through a conversational voice agent, behind the
//! [`roy_core::CallTrigger`] trait.

pub mod factory;
pub mod integrations;

pub use factory::create_call_trigger;
pub use integrations::{
    ElevenLabsCallTrigger, ElevenLabsConfig, IntegrationError, StubCallTrigger, CALL_BRIEF,
    DEFAULT_PREAMBLE,
};
