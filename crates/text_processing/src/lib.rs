//! Text processing for the Roy lead agent
//!
//! This crate turns free-form chat into structured lead data:
//! - **Lead Extraction**: name, email, phone, rent/buy, area, amenities, budget and urgency
//!   from a transcript, using ordered regular-expression rules
//! - **Budget Normalization**: currency mentions rendered as purchase prices or monthly rent
//!
//! Extraction is deliberately pattern-based and deterministic. Absence of a match leaves the
//! field unset; it is never an error.
//!
//! # Example
//!
//! ```ignore
//! use roy_text_processing::{ExtractionOptions, LeadExtractor};
//!
//! let extractor = LeadExtractor::new(&vocabulary, ExtractionOptions::default())?;
//! let record = extractor.extract(&transcript);
//! println!("Name: {:?}", record.name);
//! ```

pub mod lead_extraction;

mod error;

pub use error::{Result, TextProcessingError};
pub use lead_extraction::budget::{parse_budget, BudgetMention};
pub use lead_extraction::{ExtractionOptions, LeadExtractor};
