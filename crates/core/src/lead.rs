//! Lead record types
//!
//! [`LeadRecord`] is the partial structured view of a visitor that the extraction engine
//! builds up over a conversation. [`StoredLead`] wraps it with the bookkeeping the lead
//! store keeps (status, score, timestamps, notes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// Enumerations
// =============================================================================

/// Whether the visitor wants to rent or to buy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentOrBuy {
    Rent,
    Buy,
}

impl RentOrBuy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentOrBuy::Rent => "rent",
            RentOrBuy::Buy => "buy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rent" => Some(RentOrBuy::Rent),
            "buy" => Some(RentOrBuy::Buy),
            _ => None,
        }
    }
}

impl std::fmt::Display for RentOrBuy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical move-in urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    Asap,
    Immediate,
    Urgent,
    Soon,
    WithinAMonth,
    WithinThreeMonths,
    Flexible,
    NoRush,
    Other,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Asap => "asap",
            Urgency::Immediate => "immediate",
            Urgency::Urgent => "urgent",
            Urgency::Soon => "soon",
            Urgency::WithinAMonth => "withinAMonth",
            Urgency::WithinThreeMonths => "withinThreeMonths",
            Urgency::Flexible => "flexible",
            Urgency::NoRush => "noRush",
            Urgency::Other => "other",
        }
    }

    /// Values that earn the scorer's immediacy bonus
    pub fn is_immediate(&self) -> bool {
        matches!(
            self,
            Urgency::Asap | Urgency::Immediate | Urgency::Urgent | Urgency::Soon
        )
    }

    /// Parse a canonical value; anything unrecognised maps to [`Urgency::Other`]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        Some(match s {
            "asap" => Urgency::Asap,
            "immediate" => Urgency::Immediate,
            "urgent" => Urgency::Urgent,
            "soon" => Urgency::Soon,
            "withinAMonth" => Urgency::WithinAMonth,
            "withinThreeMonths" => Urgency::WithinThreeMonths,
            "flexible" => Urgency::Flexible,
            "noRush" => Urgency::NoRush,
            _ => Urgency::Other,
        })
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline status of a stored lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "converted" => Some(LeadStatus::Converted),
            "lost" => Some(LeadStatus::Lost),
            _ => None,
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality band of a 0-10 lead score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// 7 and above
    High,
    /// 4 to 6
    Medium,
    /// Below 4
    Low,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 7 => ScoreBand::High,
            4..=6 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(ScoreBand::High),
            "medium" => Some(ScoreBand::Medium),
            "low" => Some(ScoreBand::Low),
            _ => None,
        }
    }
}

/// Fields of a [`LeadRecord`], in the order the reply prompt lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadField {
    Name,
    Email,
    Phone,
    RentOrBuy,
    Area,
    Amenities,
    BudgetRange,
    Urgency,
}

impl LeadField {
    pub const ALL: [LeadField; 8] = [
        LeadField::Name,
        LeadField::Email,
        LeadField::Phone,
        LeadField::RentOrBuy,
        LeadField::Area,
        LeadField::Amenities,
        LeadField::BudgetRange,
        LeadField::Urgency,
    ];

    /// Fields the lead-collection form requires
    pub const FORM_REQUIRED: [LeadField; 5] = [
        LeadField::Name,
        LeadField::Email,
        LeadField::RentOrBuy,
        LeadField::Area,
        LeadField::BudgetRange,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LeadField::Name => "name",
            LeadField::Email => "email",
            LeadField::Phone => "phone",
            LeadField::RentOrBuy => "rentOrBuy",
            LeadField::Area => "area",
            LeadField::Amenities => "amenities",
            LeadField::BudgetRange => "budgetRange",
            LeadField::Urgency => "urgency",
        }
    }

    /// Upper-case label used in the reply prompt's missing-information list
    pub fn prompt_label(&self) -> &'static str {
        match self {
            LeadField::Name => "NAME",
            LeadField::Email => "EMAIL",
            LeadField::Phone => "PHONE",
            LeadField::RentOrBuy => "RENT_OR_BUY",
            LeadField::Area => "AREA",
            LeadField::Amenities => "AMENITIES",
            LeadField::BudgetRange => "BUDGET_RANGE",
            LeadField::Urgency => "URGENCY",
        }
    }
}

// =============================================================================
// LeadRecord
// =============================================================================

/// Partial structured record of a visitor
///
/// Every field starts absent. An absent field and an empty string are never conflated:
/// empty values are dropped before they reach the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_or_buy: Option<RentOrBuy>,
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    pub area: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_blank_set",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub amenities: BTreeSet<String>,
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    pub budget_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

impl LeadRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        set_non_empty(&mut self.name, Some(name.into()));
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        set_non_empty(&mut self.email, Some(email.into()));
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        set_non_empty(&mut self.phone, Some(phone.into()));
        self
    }

    pub fn with_rent_or_buy(mut self, rent_or_buy: RentOrBuy) -> Self {
        self.rent_or_buy = Some(rent_or_buy);
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        set_non_empty(&mut self.area, Some(area.into()));
        self
    }

    pub fn with_amenity(mut self, amenity: impl Into<String>) -> Self {
        let amenity = amenity.into();
        if !amenity.trim().is_empty() {
            self.amenities.insert(amenity);
        }
        self
    }

    pub fn with_budget_range(mut self, budget: impl Into<String>) -> Self {
        set_non_empty(&mut self.budget_range, Some(budget.into()));
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Whether a given field currently holds a value
    pub fn has(&self, field: LeadField) -> bool {
        match field {
            LeadField::Name => self.name.is_some(),
            LeadField::Email => self.email.is_some(),
            LeadField::Phone => self.phone.is_some(),
            LeadField::RentOrBuy => self.rent_or_buy.is_some(),
            LeadField::Area => self.area.is_some(),
            LeadField::Amenities => !self.amenities.is_empty(),
            LeadField::BudgetRange => self.budget_range.is_some(),
            LeadField::Urgency => self.urgency.is_some(),
        }
    }

    /// Rendered value of a field, if present
    pub fn value(&self, field: LeadField) -> Option<String> {
        match field {
            LeadField::Name => self.name.clone(),
            LeadField::Email => self.email.clone(),
            LeadField::Phone => self.phone.clone(),
            LeadField::RentOrBuy => self.rent_or_buy.map(|r| r.as_str().to_string()),
            LeadField::Area => self.area.clone(),
            LeadField::Amenities => {
                if self.amenities.is_empty() {
                    None
                } else {
                    Some(self.amenities.iter().cloned().collect::<Vec<_>>().join(", "))
                }
            },
            LeadField::BudgetRange => self.budget_range.clone(),
            LeadField::Urgency => self.urgency.map(|u| u.as_str().to_string()),
        }
    }

    /// Known fields with their rendered values
    pub fn known_fields(&self) -> Vec<(LeadField, String)> {
        LeadField::ALL
            .iter()
            .filter_map(|f| self.value(*f).map(|v| (*f, v)))
            .collect()
    }

    pub fn missing_fields(&self) -> Vec<LeadField> {
        LeadField::ALL
            .iter()
            .copied()
            .filter(|f| !self.has(*f))
            .collect()
    }

    /// Form-required fields that are still absent
    pub fn missing_form_fields(&self) -> Vec<LeadField> {
        LeadField::FORM_REQUIRED
            .iter()
            .copied()
            .filter(|f| !self.has(*f))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        LeadField::ALL.iter().all(|f| !self.has(*f))
    }

    /// Monotonic merge
    ///
    /// Every non-empty value in `other` overwrites the corresponding field; absent or empty
    /// values in `other` never clear anything. Amenities are unioned. Returns whether any
    /// field changed.
    pub fn merge(&mut self, other: &LeadRecord) -> bool {
        let before = self.clone();

        set_non_empty(&mut self.name, other.name.clone());
        set_non_empty(&mut self.email, other.email.clone());
        set_non_empty(&mut self.phone, other.phone.clone());
        if other.rent_or_buy.is_some() {
            self.rent_or_buy = other.rent_or_buy;
        }
        set_non_empty(&mut self.area, other.area.clone());
        for amenity in &other.amenities {
            if !amenity.trim().is_empty() {
                self.amenities.insert(amenity.clone());
            }
        }
        set_non_empty(&mut self.budget_range, other.budget_range.clone());
        if other.urgency.is_some() {
            self.urgency = other.urgency;
        }

        *self != before
    }
}

/// Blank or whitespace-only strings deserialize as absent
fn non_blank<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

fn non_blank_set<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

fn set_non_empty(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *slot = Some(trimmed.to_string());
        }
    }
}

// =============================================================================
// Stored lead and store operations
// =============================================================================

/// Lead as kept by the lead store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLead {
    pub id: String,
    #[serde(flatten)]
    pub record: LeadRecord,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub call_made: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredLead {
    /// Fresh lead with default bookkeeping: status new, score 0, no call made
    pub fn new(id: impl Into<String>, record: LeadRecord) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            record,
            status: LeadStatus::New,
            score: 0,
            call_made: false,
            conversation_summary: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update in place and bump `updated_at`
    pub fn apply(&mut self, update: &LeadUpdate) {
        self.record.merge(&update.record);
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(score) = update.score {
            self.score = score.min(10);
        }
        if let Some(call_made) = update.call_made {
            self.call_made = call_made;
        }
        if let Some(summary) = &update.conversation_summary {
            self.conversation_summary = Some(summary.clone());
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
        self.updated_at = Utc::now();
    }

    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// Partial update sent to the lead store
///
/// Record fields follow [`LeadRecord::merge`] semantics; bookkeeping fields are only
/// written when `Some`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    #[serde(flatten)]
    pub record: LeadRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_made: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LeadUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: LeadRecord) -> Self {
        self.record = record;
        self
    }

    pub fn with_status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_call_made(mut self, call_made: bool) -> Self {
        self.call_made = Some(call_made);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.conversation_summary = Some(summary.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Admin-side filter for listing leads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    /// Case-insensitive substring over name, email and area
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub score: Option<ScoreBand>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &StoredLead) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let hit = [&lead.record.name, &lead.record.email, &lead.record.area]
                    .iter()
                    .any(|f| {
                        f.as_deref()
                            .map(|v| v.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    });
                if !hit {
                    return false;
                }
            }
        }
        if let Some(status) = self.status {
            if lead.status != status {
                return false;
            }
        }
        if let Some(band) = self.score {
            if lead.score_band() != band {
                return false;
            }
        }
        true
    }
}

/// Dashboard summary counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total: usize,
    pub new: usize,
    pub contacted: usize,
    pub converted: usize,
    pub lost: usize,
    /// Score 7 and above
    pub qualified: usize,
    /// Score below 4
    pub low_quality: usize,
    pub calls_made: usize,
}

impl LeadStats {
    pub fn from_leads(leads: &[StoredLead]) -> Self {
        let mut stats = LeadStats {
            total: leads.len(),
            ..Default::default()
        };
        for lead in leads {
            match lead.status {
                LeadStatus::New => stats.new += 1,
                LeadStatus::Contacted => stats.contacted += 1,
                LeadStatus::Converted => stats.converted += 1,
                LeadStatus::Lost => stats.lost += 1,
            }
            match lead.score_band() {
                ScoreBand::High => stats.qualified += 1,
                ScoreBand::Low => stats.low_quality += 1,
                ScoreBand::Medium => {},
            }
            if lead.call_made {
                stats.calls_made += 1;
            }
        }
        stats
    }
}
