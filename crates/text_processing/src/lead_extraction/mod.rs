//! Lead Information Extraction
//!
//! Implements rule-based extraction of a [`LeadRecord`] from a chat transcript. Every rule
//! runs independently over lower-cased text; within a rule the first matching alternative
//! wins.
//!
//! ## Scope
//!
//! By default only visitor messages are read, so Roy's own questions ("rent or buy?") and
//! self-introduction never leak into the record. `ExtractionScope::RecentWindow` limits the
//! recency-sensitive fields (rent/buy, urgency) to the last N messages.
//!
//! ## Static Regex Patterns
//!
//! Fixed patterns are compiled once using `once_cell::sync::Lazy`. Vocabulary-driven
//! patterns (cities, neighbourhoods, amenities) are compiled per extractor from config.

pub mod budget;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use roy_config::{ExtractionScope, VocabularyConfig};
use roy_core::{LeadRecord, Message, RentOrBuy, Role, Transcript, Urgency};

use crate::Result;

// =============================================================================
// STATIC REGEX PATTERNS - Compiled once at program start
// =============================================================================

// Name patterns, in priority order
static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\bmy name is ([a-z][a-z'-]*)").unwrap(),
        Regex::new(r"\bi am ([a-z][a-z'-]*)").unwrap(),
        Regex::new(r"\bi['’]m ([a-z][a-z'-]*)").unwrap(),
        Regex::new(r"\bcall me ([a-z][a-z'-]*)").unwrap(),
        Regex::new(r"\bthis is ([a-z][a-z'-]*)").unwrap(),
        Regex::new(r"\b([a-z][a-z'-]*) is my name\b").unwrap(),
    ]
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}").unwrap()
});

// Phone patterns (North American numbering, optional country code)
static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\+\d{1,3}[\s.-]?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap(),
        Regex::new(r"\(\d{3}\)\s?\d{3}[\s.-]?\d{4}\b").unwrap(),
        Regex::new(r"\b\d{3}[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap(),
    ]
});

static RENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brent").unwrap());
static BUY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bbuy").unwrap());

// Urgency keywords, in priority order
static URGENCY_PATTERNS: Lazy<Vec<(Regex, Urgency)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"\basap\b").unwrap(), Urgency::Asap),
        (Regex::new(r"\bimmediate").unwrap(), Urgency::Immediate),
        (Regex::new(r"\burgent").unwrap(), Urgency::Urgent),
        (Regex::new(r"\bsoon\b").unwrap(), Urgency::Soon),
        (Regex::new(r"\bwithin (?:a|one|1) month\b").unwrap(), Urgency::WithinAMonth),
        (Regex::new(r"\bwithin (?:3|three) months\b").unwrap(), Urgency::WithinThreeMonths),
        (Regex::new(r"\bflexible\b").unwrap(), Urgency::Flexible),
        (Regex::new(r"\bno rush\b").unwrap(), Urgency::NoRush),
        (Regex::new(r"\bnot in a hurry\b").unwrap(), Urgency::NoRush),
    ]
});

/// Words that can precede an area inside a captured phrase
const AREA_CONNECTIVES: [&str; 6] = ["in", "to", "around", "near", "at", "by"];
const AREA_ARTICLES: [&str; 3] = ["the", "a", "an"];
const GENERIC_AREA_TERMS: [&str; 4] = ["area", "neighborhood", "neighbourhood", "district"];

// =============================================================================
// Extractor
// =============================================================================

/// Extraction options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractionOptions {
    pub scope: ExtractionScope,
    /// Also read Roy's messages
    pub include_assistant: bool,
}

/// Pattern-based lead extractor
pub struct LeadExtractor {
    options: ExtractionOptions,
    area_phrase: Regex,
    neighborhoods: Vec<(String, Regex)>,
    cities: Vec<(String, Regex)>,
    amenities: Vec<(String, Regex)>,
    name_stopwords: HashSet<String>,
}

impl LeadExtractor {
    /// Build an extractor from vocabulary lists
    pub fn new(vocabulary: &VocabularyConfig, options: ExtractionOptions) -> Result<Self> {
        let mut city_names: Vec<String> = vocabulary
            .cities
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        // Longest first so "north vancouver" wins over "vancouver"
        city_names.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut terminators: Vec<String> =
            GENERIC_AREA_TERMS.iter().map(|t| t.to_string()).collect();
        terminators.extend(city_names.iter().map(|c| regex::escape(c)));

        let area_phrase = Regex::new(&format!(
            r"\b(?:in|to|around|near|looking at)\s+(?P<words>[a-z\s]{{0,40}}?)\s*\b(?P<end>{})\b",
            terminators.join("|")
        ))?;

        Ok(Self {
            options,
            area_phrase,
            neighborhoods: keyword_patterns(&vocabulary.neighborhoods, true)?,
            cities: keyword_patterns(&city_names, true)?,
            amenities: keyword_patterns(&vocabulary.amenities, false)?,
            name_stopwords: vocabulary
                .name_stopwords
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        })
    }

    /// Extractor over the default vocabulary
    pub fn with_defaults() -> Result<Self> {
        Self::new(&VocabularyConfig::default(), ExtractionOptions::default())
    }

    pub fn options(&self) -> ExtractionOptions {
        self.options
    }

    /// Extract a lead record from a transcript
    ///
    /// Deterministic and total: running it twice over the same transcript yields the same
    /// record, and a missing pattern simply leaves the field unset.
    pub fn extract(&self, transcript: &Transcript) -> LeadRecord {
        let full = self.text_of(transcript.messages());
        let recent = match self.options.scope {
            ExtractionScope::FullTranscript => None,
            ExtractionScope::RecentWindow { messages } => {
                Some(self.text_of(transcript.recent(messages)))
            },
        };

        let record = self.extract_text(&full, recent.as_deref().unwrap_or(&full));
        tracing::debug!(
            messages = transcript.len(),
            fields = record.known_fields().len(),
            "Extracted lead fields"
        );
        record
    }

    /// Extract from already lower-cased text
    ///
    /// `recent` feeds the recency-sensitive rules (rent/buy, urgency); pass the same text
    /// twice for full-transcript behaviour.
    pub fn extract_text(&self, full: &str, recent: &str) -> LeadRecord {
        LeadRecord {
            name: self.extract_name(full),
            email: extract_email(full),
            phone: extract_phone(full),
            rent_or_buy: extract_rent_or_buy(recent),
            area: self.extract_area(full),
            amenities: self
                .amenities
                .iter()
                .filter(|(_, re)| re.is_match(full))
                .map(|(name, _)| name.clone())
                .collect(),
            budget_range: budget::parse_budget(full).map(|m| m.normalized()),
            urgency: extract_urgency(recent),
        }
    }

    fn text_of(&self, messages: &[Message]) -> String {
        messages
            .iter()
            .filter(|m| self.options.include_assistant || m.role == Role::User)
            .map(|m| m.content.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn extract_name(&self, text: &str) -> Option<String> {
        for pattern in NAME_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let Some(word) = caps.get(1).map(|m| m.as_str()) else {
                    continue;
                };
                let word = word.trim_matches(|c| c == '\'' || c == '-');
                if word.is_empty() || self.name_stopwords.contains(word) {
                    continue;
                }
                return Some(capitalize(word));
            }
        }
        None
    }

    fn extract_area(&self, text: &str) -> Option<String> {
        for caps in self.area_phrase.captures_iter(text) {
            let words = caps.name("words").map(|m| m.as_str()).unwrap_or("");
            let end = caps.name("end").map(|m| m.as_str()).unwrap_or("");
            let words = clean_area_words(words);

            let area = if GENERIC_AREA_TERMS.contains(&end) {
                words
            } else if words.is_empty() {
                end.to_string()
            } else {
                format!("{} {}", words, end)
            };
            if !area.is_empty() {
                return Some(area);
            }
        }

        self.neighborhoods
            .iter()
            .chain(self.cities.iter())
            .find(|(_, re)| re.is_match(text))
            .map(|(name, _)| name.clone())
    }
}

/// Compile `\bkeyword` (or `\bkeyword\b` when `whole_word`) for each non-empty entry
fn keyword_patterns(keywords: &[String], whole_word: bool) -> Result<Vec<(String, Regex)>> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .map(|k| {
            let pattern = if whole_word {
                format!(r"\b{}\b", regex::escape(&k))
            } else {
                format!(r"\b{}", regex::escape(&k))
            };
            Ok((k, Regex::new(&pattern)?))
        })
        .collect()
}

fn extract_email(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

fn extract_phone(text: &str) -> Option<String> {
    PHONE_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().trim().to_string())
}

/// Rent xor buy; both or neither leaves the field unset
fn extract_rent_or_buy(text: &str) -> Option<RentOrBuy> {
    match (RENT_PATTERN.is_match(text), BUY_PATTERN.is_match(text)) {
        (true, false) => Some(RentOrBuy::Rent),
        (false, true) => Some(RentOrBuy::Buy),
        _ => None,
    }
}

fn extract_urgency(text: &str) -> Option<Urgency> {
    URGENCY_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, urgency)| *urgency)
}

/// Keep only the words after the last connective, minus leading articles
fn clean_area_words(words: &str) -> String {
    let tokens: Vec<&str> = words.split_whitespace().collect();
    let start = tokens
        .iter()
        .rposition(|t| AREA_CONNECTIVES.contains(t))
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut tail = &tokens[start..];
    while let Some(first) = tail.first() {
        if AREA_ARTICLES.contains(first) {
            tail = &tail[1..];
        } else {
            break;
        }
    }
    tail.join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
