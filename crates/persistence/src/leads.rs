//! Lead store implementations
//!
//! - `InMemoryLeadStore`: process-local map for development and tests
//! - `SupabaseLeadStore`: the `leads` table over PostgREST

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use roy_core::{LeadFilter, LeadRecord, LeadStore, LeadUpdate, StoredLead};

use crate::client::SupabaseClient;
use crate::schema::{LeadColumns, LeadRow};
use crate::PersistenceError;

// ============================================================================
// In-memory
// ============================================================================

/// In-memory lead store
///
/// Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryLeadStore {
    // Value carries an insertion sequence so equal timestamps still list newest first
    leads: RwLock<HashMap<String, (u64, StoredLead)>>,
    sequence: AtomicU64,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.leads.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.read().is_empty()
    }

    fn next_id() -> String {
        format!(
            "LEAD-{}",
            uuid::Uuid::new_v4().to_string()[..8].to_uppercase()
        )
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create(&self, initial: &LeadRecord) -> roy_core::Result<String> {
        let id = Self::next_id();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.leads
            .write()
            .insert(id.clone(), (seq, StoredLead::new(id.clone(), initial.clone())));
        tracing::debug!(lead_id = %id, "Lead created in memory");
        Ok(id)
    }

    async fn update(&self, lead_id: &str, update: &LeadUpdate) -> roy_core::Result<()> {
        let mut leads = self.leads.write();
        let (_, lead) = leads
            .get_mut(lead_id)
            .ok_or_else(|| PersistenceError::NotFound(lead_id.to_string()))?;
        lead.apply(update);
        Ok(())
    }

    async fn delete(&self, lead_id: &str) -> roy_core::Result<()> {
        self.leads
            .write()
            .remove(lead_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound(lead_id.to_string()).into())
    }

    async fn get(&self, lead_id: &str) -> roy_core::Result<StoredLead> {
        self.leads
            .read()
            .get(lead_id)
            .map(|(_, lead)| lead.clone())
            .ok_or_else(|| PersistenceError::NotFound(lead_id.to_string()).into())
    }

    async fn list(&self, filter: &LeadFilter) -> roy_core::Result<Vec<StoredLead>> {
        let leads = self.leads.read();
        let mut matched: Vec<&(u64, StoredLead)> =
            leads.values().filter(|(_, lead)| filter.matches(lead)).collect();
        matched.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });
        Ok(matched.into_iter().map(|(_, lead)| lead.clone()).collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Supabase
// ============================================================================

/// Lead store backed by a Supabase table
pub struct SupabaseLeadStore {
    client: SupabaseClient,
}

impl SupabaseLeadStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn id_filter(lead_id: &str) -> String {
        format!("eq.{}", lead_id)
    }

    async fn fetch(&self, lead_id: &str) -> Result<StoredLead, PersistenceError> {
        let response = self
            .client
            .request(Method::GET)
            .query(&[("id", Self::id_filter(lead_id).as_str()), ("select", "*")])
            .send()
            .await?;
        let rows: Vec<LeadRow> = SupabaseClient::check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PersistenceError::NotFound(lead_id.to_string()))?
            .into_stored()
    }

    async fn fetch_all(&self, filter: &LeadFilter) -> Result<Vec<StoredLead>, PersistenceError> {
        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(status) = filter.status {
            query.push(("status", format!("eq.{}", status)));
        }

        let response = self
            .client
            .request(Method::GET)
            .query(&query)
            .send()
            .await?;
        let rows: Vec<LeadRow> = SupabaseClient::check(response).await?.json().await?;

        // Search and score band are applied locally
        let mut leads = Vec::with_capacity(rows.len());
        for row in rows {
            let lead = row.into_stored()?;
            if filter.matches(&lead) {
                leads.push(lead);
            }
        }
        Ok(leads)
    }
}

#[async_trait]
impl LeadStore for SupabaseLeadStore {
    async fn create(&self, initial: &LeadRecord) -> roy_core::Result<String> {
        let response = self
            .client
            .request(Method::POST)
            .json(&[LeadColumns::for_insert(initial)])
            .send()
            .await
            .map_err(PersistenceError::from)?;
        let rows: Vec<LeadRow> = SupabaseClient::check(response)
            .await?
            .json()
            .await
            .map_err(PersistenceError::from)?;

        let id = rows
            .first()
            .ok_or_else(|| PersistenceError::InvalidData("insert returned no rows".into()))?
            .id_string()?;
        tracing::info!(lead_id = %id, table = %self.client.table(), "Lead created");
        Ok(id)
    }

    async fn update(&self, lead_id: &str, update: &LeadUpdate) -> roy_core::Result<()> {
        let response = self
            .client
            .request(Method::PATCH)
            .query(&[("id", Self::id_filter(lead_id))])
            .json(&LeadColumns::for_update(update))
            .send()
            .await
            .map_err(PersistenceError::from)?;
        let rows: Vec<serde_json::Value> = SupabaseClient::check(response)
            .await?
            .json()
            .await
            .map_err(PersistenceError::from)?;
        if rows.is_empty() {
            return Err(PersistenceError::NotFound(lead_id.to_string()).into());
        }
        tracing::debug!(lead_id = %lead_id, "Lead updated");
        Ok(())
    }

    async fn delete(&self, lead_id: &str) -> roy_core::Result<()> {
        let response = self
            .client
            .request(Method::DELETE)
            .query(&[("id", Self::id_filter(lead_id))])
            .send()
            .await
            .map_err(PersistenceError::from)?;
        let rows: Vec<serde_json::Value> = SupabaseClient::check(response)
            .await?
            .json()
            .await
            .map_err(PersistenceError::from)?;
        if rows.is_empty() {
            return Err(PersistenceError::NotFound(lead_id.to_string()).into());
        }
        tracing::info!(lead_id = %lead_id, "Lead deleted");
        Ok(())
    }

    async fn get(&self, lead_id: &str) -> roy_core::Result<StoredLead> {
        Ok(self.fetch(lead_id).await?)
    }

    async fn list(&self, filter: &LeadFilter) -> roy_core::Result<Vec<StoredLead>> {
        Ok(self.fetch_all(filter).await?)
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .request(Method::GET)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Supabase health check failed");
                false
            },
        }
    }

    fn name(&self) -> &str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roy_core::{LeadStatus, RentOrBuy, ScoreBand};

    #[tokio::test]
    async fn test_create_get_update() {
        let store = InMemoryLeadStore::new();
        let id = store
            .create(&LeadRecord::new().with_name("Bob"))
            .await
            .unwrap();
        assert!(id.starts_with("LEAD-"));

        let lead = store.get(&id).await.unwrap();
        assert_eq!(lead.record.name.as_deref(), Some("Bob"));
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.score, 0);
        assert!(!lead.call_made);

        store
            .update(
                &id,
                &LeadUpdate::new()
                    .with_record(LeadRecord::new().with_rent_or_buy(RentOrBuy::Rent))
                    .with_score(5),
            )
            .await
            .unwrap();
        let lead = store.get(&id).await.unwrap();
        assert_eq!(lead.record.name.as_deref(), Some("Bob"));
        assert_eq!(lead.record.rent_or_buy, Some(RentOrBuy::Rent));
        assert_eq!(lead.score, 5);
    }

    #[tokio::test]
    async fn test_missing_lead() {
        let store = InMemoryLeadStore::new();
        assert!(matches!(
            store.get("LEAD-NOPE").await,
            Err(roy_core::Error::NotFound(_))
        ));
        assert!(matches!(
            store.update("LEAD-NOPE", &LeadUpdate::new()).await,
            Err(roy_core::Error::NotFound(_))
        ));
        assert!(store.delete("LEAD-NOPE").await.is_err());
    }

    #[tokio::test]
    async fn test_list_newest_first_filtered() {
        let store = InMemoryLeadStore::new();
        let first = store.create(&LeadRecord::new().with_name("Alice")).await.unwrap();
        let second = store.create(&LeadRecord::new().with_name("Bob")).await.unwrap();
        let third = store.create(&LeadRecord::new().with_name("Carol")).await.unwrap();
        store
            .update(&third, &LeadUpdate::new().with_score(8))
            .await
            .unwrap();

        let all = store.list(&LeadFilter::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![third.as_str(), second.as_str(), first.as_str()]);

        let high = store
            .list(&LeadFilter {
                score: Some(ScoreBand::High),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, third);

        store.delete(&second).await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
