//! Core traits and types for the Roy lead agent
//!
//! This crate provides foundational types used across all other crates:
//! - Chat messages and transcripts
//! - The partial lead record and its stored bookkeeping
//! - Property listings
//! - Collaborator traits (reply generation, lead storage, outbound calls)
//! - CSV / text export
//! - Error types

pub mod conversation;
pub mod error;
pub mod export;
pub mod lead;
pub mod listing;
pub mod traits;

pub use conversation::{Message, Role, Transcript};
pub use error::{Error, Result};
pub use lead::{
    LeadField, LeadFilter, LeadRecord, LeadStats, LeadStatus, LeadUpdate, RentOrBuy, ScoreBand,
    StoredLead, Urgency,
};
pub use listing::Listing;
pub use traits::{CallReceipt, CallTrigger, LeadStore, Replies, ReplyGenerator};
