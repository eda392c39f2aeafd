//! `leads` table row mapping
//!
//! Column layout of the Supabase table:
//!
//! ```sql
//! CREATE TABLE leads (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name TEXT,
//!     email TEXT,
//!     phone TEXT,
//!     rent_or_buy TEXT,
//!     area TEXT,
//!     amenities TEXT[],
//!     budget_range TEXT,
//!     urgency TEXT,
//!     lead_score INT DEFAULT 0,
//!     status TEXT DEFAULT 'new',
//!     phone_call_made BOOLEAN DEFAULT FALSE,
//!     conversation_summary TEXT,
//!     notes TEXT,
//!     created_at TIMESTAMPTZ DEFAULT now(),
//!     updated_at TIMESTAMPTZ DEFAULT now()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roy_core::{LeadRecord, LeadStatus, LeadUpdate, RentOrBuy, StoredLead, Urgency};

use crate::PersistenceError;

/// Row as returned by PostgREST
#[derive(Debug, Clone, Deserialize)]
pub struct LeadRow {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rent_or_buy: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub lead_score: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub phone_call_made: Option<bool>,
    #[serde(default)]
    pub conversation_summary: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LeadRow {
    /// Row id as a string; numeric and uuid keys are both accepted
    pub fn id_string(&self) -> Result<String, PersistenceError> {
        match &self.id {
            serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(PersistenceError::InvalidData(format!(
                "unexpected lead id: {}",
                other
            ))),
        }
    }

    pub fn into_stored(self) -> Result<StoredLead, PersistenceError> {
        let id = self.id_string()?;

        let raw = LeadRecord {
            name: self.name,
            email: self.email,
            phone: self.phone,
            rent_or_buy: self.rent_or_buy.as_deref().and_then(RentOrBuy::parse),
            area: self.area,
            budget_range: self.budget_range,
            urgency: self.urgency.as_deref().and_then(Urgency::parse),
            ..Default::default()
        };
        // Merge into an empty record so blank columns read back as absent
        let mut record = self
            .amenities
            .unwrap_or_default()
            .into_iter()
            .fold(LeadRecord::new(), LeadRecord::with_amenity);
        record.merge(&raw);

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ok(StoredLead {
            id,
            record,
            status: self
                .status
                .as_deref()
                .and_then(LeadStatus::parse)
                .unwrap_or_default(),
            score: self.lead_score.unwrap_or(0).clamp(0, 10) as u8,
            call_made: self.phone_call_made.unwrap_or(false),
            conversation_summary: self.conversation_summary,
            notes: self.notes,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        })
    }
}

/// Column subset written by insert and patch; unset columns are left to the database
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeadColumns {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_or_buy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_call_made: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LeadColumns {
    fn from_record(record: &LeadRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            rent_or_buy: record.rent_or_buy.map(|r| r.as_str().to_string()),
            area: record.area.clone(),
            amenities: if record.amenities.is_empty() {
                None
            } else {
                Some(record.amenities.iter().cloned().collect())
            },
            budget_range: record.budget_range.clone(),
            urgency: record.urgency.map(|u| u.as_str().to_string()),
            ..Default::default()
        }
    }

    /// Columns for a fresh lead: status new, score 0, no call made
    pub fn for_insert(initial: &LeadRecord) -> Self {
        Self {
            lead_score: Some(0),
            status: Some(LeadStatus::New.as_str().to_string()),
            phone_call_made: Some(false),
            ..Self::from_record(initial)
        }
    }

    /// Columns touched by an update; always bumps `updated_at`
    ///
    /// Amenities replace the stored array, so callers send the full set.
    pub fn for_update(update: &LeadUpdate) -> Self {
        Self {
            lead_score: update.score.map(|s| s.min(10)),
            status: update.status.map(|s| s.as_str().to_string()),
            phone_call_made: update.call_made,
            conversation_summary: update.conversation_summary.clone(),
            notes: update.notes.clone(),
            updated_at: Some(Utc::now()),
            ..Self::from_record(&update.record)
        }
    }
}
