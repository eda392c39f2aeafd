//! End-to-end session behaviour against in-process collaborators

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use roy_agent::{build_extractor, AgentError, Collaborators, ConversationSession, SessionState};
use roy_config::constants::messages;
use roy_config::{AgentConfig, VocabularyConfig};
use roy_core::{
    CallReceipt, CallTrigger, Error, LeadFilter, LeadRecord, LeadStatus, LeadStore, LeadUpdate,
    RentOrBuy, Replies, ReplyGenerator, Result, StoredLead, Transcript, Urgency,
};

// =============================================================================
// Test collaborators
// =============================================================================

/// Replies with a fixed list of fragments, or fails every time
struct CannedReplies {
    fragments: Vec<String>,
    fail: bool,
    seen_counts: Mutex<Vec<usize>>,
}

impl CannedReplies {
    fn new(fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            fail: false,
            seen_counts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fragments: Vec::new(),
            fail: true,
            seen_counts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ReplyGenerator for CannedReplies {
    async fn generate(
        &self,
        _transcript: &Transcript,
        _known: &LeadRecord,
        message_count: usize,
    ) -> Result<Replies> {
        self.seen_counts.lock().push(message_count);
        if self.fail {
            return Err(Error::Reply("HTTP 529: overloaded".to_string()));
        }
        Replies::from_fragments(self.fragments.clone())
            .ok_or_else(|| Error::Reply("empty".to_string()))
    }

    fn name(&self) -> &str {
        "canned"
    }
}

#[derive(Default)]
struct FlakyStore {
    leads: Mutex<HashMap<String, StoredLead>>,
    fail_create: bool,
    fail_update: bool,
    updates: Mutex<usize>,
}

#[async_trait]
impl LeadStore for FlakyStore {
    async fn create(&self, initial: &LeadRecord) -> Result<String> {
        if self.fail_create {
            return Err(Error::Store("connection refused".to_string()));
        }
        let mut leads = self.leads.lock();
        let id = format!("lead-{}", leads.len() + 1);
        leads.insert(id.clone(), StoredLead::new(id.clone(), initial.clone()));
        Ok(id)
    }

    async fn update(&self, lead_id: &str, update: &LeadUpdate) -> Result<()> {
        *self.updates.lock() += 1;
        if self.fail_update {
            return Err(Error::Store("timeout".to_string()));
        }
        let mut leads = self.leads.lock();
        let lead = leads
            .get_mut(lead_id)
            .ok_or_else(|| Error::NotFound(lead_id.to_string()))?;
        lead.apply(update);
        Ok(())
    }

    async fn delete(&self, lead_id: &str) -> Result<()> {
        self.leads.lock().remove(lead_id);
        Ok(())
    }

    async fn get(&self, lead_id: &str) -> Result<StoredLead> {
        self.leads
            .lock()
            .get(lead_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(lead_id.to_string()))
    }

    async fn list(&self, _filter: &LeadFilter) -> Result<Vec<StoredLead>> {
        Ok(self.leads.lock().values().cloned().collect())
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[derive(Default)]
struct RecordingCalls {
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CallTrigger for RecordingCalls {
    async fn initiate(&self, phone_number: &str, transcript_summary: &str) -> Result<CallReceipt> {
        self.calls
            .lock()
            .push((phone_number.to_string(), transcript_summary.to_string()));
        if self.fail {
            return Err(Error::Call("HTTP 401: invalid key".to_string()));
        }
        Ok(CallReceipt {
            call_id: "conv_123".to_string(),
        })
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct Harness {
    session: ConversationSession,
    replies: Arc<CannedReplies>,
    store: Arc<FlakyStore>,
    calls: Arc<RecordingCalls>,
}

fn harness_with(
    config: AgentConfig,
    replies: Arc<CannedReplies>,
    store: FlakyStore,
    calls: RecordingCalls,
) -> Harness {
    let store = Arc::new(store);
    let calls = Arc::new(calls);
    let extractor = Arc::new(build_extractor(&config, &VocabularyConfig::default()).unwrap());
    let collaborators = Collaborators {
        replies: replies.clone(),
        store: store.clone(),
        calls: calls.clone(),
    };
    Harness {
        session: ConversationSession::new("s-1", config, extractor, collaborators),
        replies,
        store,
        calls,
    }
}

fn harness() -> Harness {
    harness_with(
        AgentConfig::default(),
        CannedReplies::new(&["Great! Tell me more."]),
        FlakyStore::default(),
        RecordingCalls::default(),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_open_shows_welcome_once() {
    let mut h = harness();
    assert_eq!(h.session.state(), SessionState::Idle);

    let welcome = h.session.open().unwrap();
    assert_eq!(welcome.content, messages::WELCOME);
    assert_eq!(h.session.message_count(), 1);
    assert_eq!(h.session.state(), SessionState::Active);

    assert!(matches!(h.session.open(), Err(AgentError::AlreadyOpen)));
    assert_eq!(h.session.transcript().len(), 1);
}

#[tokio::test]
async fn test_send_before_open_is_rejected() {
    let mut h = harness();
    let err = h.session.send("hello").await.unwrap_err();
    assert!(matches!(err, AgentError::NotActive(SessionState::Idle)));
    assert!(h.session.transcript().is_empty());
}

#[tokio::test]
async fn test_empty_message_is_rejected_without_mutation() {
    let mut h = harness();
    h.session.open().unwrap();
    let err = h.session.send("   ").await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidInput(_)));
    assert_eq!(h.session.message_count(), 1);
    assert!(h.session.lead_id().is_none());
}

#[tokio::test]
async fn test_first_message_creates_lead_and_extracts() {
    let mut h = harness();
    h.session.open().unwrap();

    let outcome = h.session.send("I'm Bob").await.unwrap();
    assert_eq!(h.session.lead_id(), Some("lead-1"));
    assert_eq!(outcome.replies.len(), 1);
    assert_eq!(outcome.message_count, 3);

    let outcome = h.session.send("bob@x.com rent downtown asap").await.unwrap();
    assert_eq!(outcome.lead.name.as_deref(), Some("Bob"));
    assert_eq!(outcome.lead.email.as_deref(), Some("bob@x.com"));
    assert_eq!(outcome.lead.rent_or_buy, Some(RentOrBuy::Rent));
    assert_eq!(outcome.lead.urgency, Some(Urgency::Asap));
    assert!(outcome.lead.area.as_deref().unwrap().contains("downtown"));
    assert_eq!(outcome.score, 6);

    // The generator saw the count including the visitor's message
    assert_eq!(*h.replies.seen_counts.lock(), vec![2, 4]);

    let stored = h.store.get("lead-1").await.unwrap();
    assert_eq!(stored.record.email.as_deref(), Some("bob@x.com"));
    assert_eq!(stored.score, 6);
    assert_eq!(stored.status, LeadStatus::New);
    assert!(stored
        .conversation_summary
        .unwrap()
        .contains("user: bob@x.com rent downtown asap"));
}

#[tokio::test]
async fn test_create_failure_rolls_back_turn() {
    let mut h = harness_with(
        AgentConfig::default(),
        CannedReplies::new(&["ok"]),
        FlakyStore {
            fail_create: true,
            ..Default::default()
        },
        RecordingCalls::default(),
    );
    h.session.open().unwrap();

    let err = h.session.send("hi there").await.unwrap_err();
    assert!(matches!(err, AgentError::Core(Error::Store(_))));
    assert_eq!(h.session.message_count(), 1);
    assert_eq!(h.session.transcript().len(), 1);
    assert!(h.replies.seen_counts.lock().is_empty());
}

#[tokio::test]
async fn test_reply_failure_uses_fallback() {
    let mut h = harness_with(
        AgentConfig::default(),
        CannedReplies::failing(),
        FlakyStore::default(),
        RecordingCalls::default(),
    );
    h.session.open().unwrap();

    let outcome = h.session.send("my name is Alice").await.unwrap();
    assert!(outcome.reply_failed);
    assert_eq!(outcome.replies.len(), 1);
    assert_eq!(outcome.replies[0].content, messages::REPLY_FALLBACK);
    assert_eq!(outcome.message_count, 3);
    assert_eq!(outcome.lead.name.as_deref(), Some("Alice"));
    assert_eq!(h.session.state(), SessionState::Active);
}

#[tokio::test]
async fn test_update_failure_is_swallowed() {
    let mut h = harness_with(
        AgentConfig::default(),
        CannedReplies::new(&["ok"]),
        FlakyStore {
            fail_update: true,
            ..Default::default()
        },
        RecordingCalls::default(),
    );
    h.session.open().unwrap();

    let outcome = h.session.send("my name is Alice").await.unwrap();
    assert_eq!(outcome.lead.name.as_deref(), Some("Alice"));
    assert_eq!(*h.store.updates.lock(), 1);
}

#[tokio::test]
async fn test_multi_fragment_replies_count_individually() {
    let mut h = harness_with(
        AgentConfig::default(),
        CannedReplies::new(&["Hi Bob!", "Are you renting or buying?"]),
        FlakyStore::default(),
        RecordingCalls::default(),
    );
    h.session.open().unwrap();
    let outcome = h.session.send("I'm Bob").await.unwrap();
    assert_eq!(outcome.replies.len(), 2);
    assert_eq!(h.session.message_count(), 4);
}

#[tokio::test]
async fn test_message_ceiling_latches_call_prompt() {
    let config = AgentConfig {
        max_messages: 5,
        call_prompt_threshold: 30,
        ..Default::default()
    };
    let mut h = harness_with(
        config,
        CannedReplies::new(&["ok"]),
        FlakyStore::default(),
        RecordingCalls::default(),
    );
    h.session.open().unwrap();
    h.session.send("one").await.unwrap();
    h.session.send("two").await.unwrap();
    assert_eq!(h.session.message_count(), 5);
    assert!(!h.session.flags().call_prompt_shown);

    let err = h.session.send("three").await.unwrap_err();
    assert!(matches!(err, AgentError::LimitReached { max: 5 }));
    assert_eq!(h.session.state(), SessionState::LimitReached);
    assert!(h.session.flags().call_prompt_shown);
    assert!(h.session.flags().completed);
    assert_eq!(h.session.message_count(), 5);

    // Still rejected, still within the ceiling
    assert!(h.session.send("four").await.is_err());
    assert!(h.session.message_count() <= 5);
}

#[tokio::test]
async fn test_fragments_truncated_at_ceiling() {
    let config = AgentConfig {
        max_messages: 4,
        ..Default::default()
    };
    let mut h = harness_with(
        config,
        CannedReplies::new(&["a", "b", "c"]),
        FlakyStore::default(),
        RecordingCalls::default(),
    );
    h.session.open().unwrap();
    let outcome = h.session.send("hi").await.unwrap();
    assert_eq!(outcome.replies.len(), 2);
    assert_eq!(h.session.message_count(), 4);
}

#[tokio::test]
async fn test_call_prompt_threshold() {
    let config = AgentConfig {
        call_prompt_threshold: 5,
        ..Default::default()
    };
    let mut h = harness_with(
        config,
        CannedReplies::new(&["ok"]),
        FlakyStore::default(),
        RecordingCalls::default(),
    );
    h.session.open().unwrap();
    let first = h.session.send("one").await.unwrap();
    assert!(!first.flags.call_prompt_shown);
    let second = h.session.send("two").await.unwrap();
    assert!(second.flags.call_prompt_shown);
    assert!(second.flags.completed);
    assert_eq!(second.state, SessionState::Active);
}

#[tokio::test]
async fn test_lead_form_latch_needs_fields_and_messages() {
    let config = AgentConfig {
        lead_form_min_messages: 5,
        ..Default::default()
    };
    let mut h = harness_with(
        config,
        CannedReplies::new(&["ok"]),
        FlakyStore::default(),
        RecordingCalls::default(),
    );
    h.session.open().unwrap();
    let outcome = h
        .session
        .send("my name is alice, alice@example.com, i want to rent in burnaby for $2000/month")
        .await
        .unwrap();
    assert!(outcome.lead.missing_form_fields().is_empty());
    assert!(!outcome.flags.lead_form_shown);

    let outcome = h.session.send("thanks").await.unwrap();
    assert!(outcome.flags.lead_form_shown);
}

#[tokio::test]
async fn test_request_call_success() {
    let mut h = harness();
    h.session.open().unwrap();
    h.session.send("my name is Alice").await.unwrap();
    let count = h.session.message_count();

    let outcome = h.session.request_call(" 604-555-1234 ").await.unwrap();
    assert!(outcome.placed);
    assert_eq!(outcome.call_id.as_deref(), Some("conv_123"));
    assert!(outcome.message.content.contains("calling you now at 604-555-1234"));
    assert!(h.session.flags().completed);
    assert_eq!(h.session.lead().phone.as_deref(), Some("604-555-1234"));
    assert_eq!(h.session.message_count(), count);

    let (phone, summary) = h.calls.calls.lock()[0].clone();
    assert_eq!(phone, "604-555-1234");
    assert!(summary.starts_with("Roy: "));
    assert!(summary.contains("User: my name is Alice"));

    let stored = h.store.get("lead-1").await.unwrap();
    assert_eq!(stored.status, LeadStatus::Contacted);
    assert!(stored.call_made);
    assert_eq!(stored.record.phone.as_deref(), Some("604-555-1234"));
}

#[tokio::test]
async fn test_request_call_failure_apologises() {
    let mut h = harness_with(
        AgentConfig::default(),
        CannedReplies::new(&["ok"]),
        FlakyStore::default(),
        RecordingCalls {
            fail: true,
            ..Default::default()
        },
    );
    h.session.open().unwrap();
    let outcome = h.session.request_call("604-555-1234").await.unwrap();
    assert!(!outcome.placed);
    assert_eq!(outcome.message.content, messages::CALL_FAILED);
    assert!(h.session.flags().completed);
    assert_eq!(h.session.lead().phone.as_deref(), Some("604-555-1234"));
}

#[tokio::test]
async fn test_request_call_requires_phone() {
    let mut h = harness();
    h.session.open().unwrap();
    let err = h.session.request_call("  ").await.unwrap_err();
    assert!(matches!(err, AgentError::Validation(_)));
    assert!(h.calls.calls.lock().is_empty());
    assert!(!h.session.flags().completed);
}

#[tokio::test]
async fn test_lead_form_validation() {
    let mut h = harness();
    h.session.open().unwrap();

    let partial = LeadRecord::new().with_name("Alice").with_email("alice@example.com");
    let err = h.session.submit_lead_form(&partial).await.unwrap_err();
    match err {
        AgentError::Validation(msg) => {
            assert!(msg.contains("rentOrBuy"));
            assert!(msg.contains("area"));
            assert!(msg.contains("budgetRange"));
        },
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(h.session.lead().is_empty());

    let full = partial
        .with_rent_or_buy(RentOrBuy::Rent)
        .with_area("Burnaby")
        .with_budget_range("$2,000/month");
    let lead = h.session.submit_lead_form(&full).await.unwrap();
    assert_eq!(lead.area.as_deref(), Some("Burnaby"));
    assert_eq!(h.session.score(), 5);

    let stored = h.store.get("lead-1").await.unwrap();
    assert_eq!(stored.record.budget_range.as_deref(), Some("$2,000/month"));
}

#[tokio::test]
async fn test_lead_form_rejects_blank_required_fields() {
    let mut h = harness();
    h.session.open().unwrap();

    let form: LeadRecord = serde_json::from_str(
        r#"{"name":"","email":"   ","rentOrBuy":"rent","area":"Burnaby","budgetRange":"$2,000/month"}"#,
    )
    .unwrap();
    let err = h.session.submit_lead_form(&form).await.unwrap_err();
    match err {
        AgentError::Validation(msg) => {
            assert!(msg.contains("name"));
            assert!(msg.contains("email"));
        },
        other => panic!("unexpected error: {:?}", other),
    }

    // Blank values set directly on the struct are treated the same way
    let form = LeadRecord {
        name: Some(" ".to_string()),
        email: Some("dana@example.com".to_string()),
        rent_or_buy: Some(RentOrBuy::Rent),
        area: Some("Burnaby".to_string()),
        budget_range: Some("$2,000/month".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        h.session.submit_lead_form(&form).await,
        Err(AgentError::Validation(_))
    ));
    assert!(h.session.lead().is_empty());
    assert!(h.session.lead_id().is_none());
}

#[tokio::test]
async fn test_form_values_survive_later_extraction() {
    let mut h = harness();
    h.session.open().unwrap();

    let form = LeadRecord::new()
        .with_name("Dana")
        .with_email("dana@example.com")
        .with_rent_or_buy(RentOrBuy::Rent)
        .with_area("Metrotown, Burnaby")
        .with_budget_range("$2,000/month");
    h.session.submit_lead_form(&form).await.unwrap();

    h.session
        .send("i want to rent in burnaby, my name is alice")
        .await
        .unwrap();
    assert_eq!(h.session.lead().area.as_deref(), Some("Metrotown, Burnaby"));
    assert_eq!(h.session.lead().name.as_deref(), Some("Dana"));
}

#[tokio::test]
async fn test_merge_never_unsets_fields() {
    let mut h = harness();
    h.session.open().unwrap();
    h.session.send("my name is Alice").await.unwrap();
    h.session.send("nothing useful here").await.unwrap();
    assert_eq!(h.session.lead().name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_snapshot_serializes() {
    let mut h = harness();
    h.session.open().unwrap();
    h.session.send("I'm Bob").await.unwrap();

    let json = serde_json::to_value(h.session.snapshot()).unwrap();
    assert_eq!(json["state"], "active");
    assert_eq!(json["messageCount"], 3);
    assert_eq!(json["leadId"], "lead-1");
    assert_eq!(json["lead"]["name"], "Bob");
    assert_eq!(json["flags"]["callPromptShown"], false);
    assert_eq!(json["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_pacing_delays_fragments() {
    let config = AgentConfig {
        pacing_enabled: true,
        ..Default::default()
    };
    let mut h = harness_with(
        config,
        CannedReplies::new(&["hello", "world"]),
        FlakyStore::default(),
        RecordingCalls::default(),
    );
    h.session.open().unwrap();

    let start = tokio::time::Instant::now();
    h.session.send("hi").await.unwrap();
    // 75ms + 500ms + 75ms
    assert!(start.elapsed() >= std::time::Duration::from_millis(650));
}
