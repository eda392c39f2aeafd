//! Lead persistence for the Roy lead agent
//!
//! Provides [`roy_core::LeadStore`] backends:
//! - In-memory (development, tests)
//! - Supabase `leads` table via PostgREST

pub mod client;
pub mod error;
pub mod leads;
pub mod schema;

pub use client::{SupabaseClient, SupabaseConfig};
pub use error::PersistenceError;
pub use leads::{InMemoryLeadStore, SupabaseLeadStore};
pub use schema::{LeadColumns, LeadRow};

use std::sync::Arc;

use roy_config::{StoreBackend, StoreConfig};
use roy_core::LeadStore;

/// Initialize the configured lead store
pub fn init(config: &StoreConfig) -> Result<Arc<dyn LeadStore>, PersistenceError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory lead store");
            Ok(Arc::new(InMemoryLeadStore::new()))
        },
        StoreBackend::Supabase => {
            let client = SupabaseClient::new(SupabaseConfig::from_settings(config)?)?;
            Ok(Arc::new(SupabaseLeadStore::new(client)))
        },
    }
}
