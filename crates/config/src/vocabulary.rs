//! Keyword vocabularies used by lead extraction
//!
//! The lists are data, not logic: deployments covering another region override them in
//! `config/default.yaml` under `vocabulary:`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Municipality names that terminate an area phrase ("near the park in burnaby")
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,

    /// Neighbourhood names matched anywhere in the transcript
    #[serde(default = "default_neighborhoods")]
    pub neighborhoods: Vec<String>,

    /// Amenity keywords matched as substrings
    #[serde(default = "default_amenities")]
    pub amenities: Vec<String>,

    /// Words that follow "i'm" / "i am" but are not names
    #[serde(default = "default_name_stopwords")]
    pub name_stopwords: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_cities() -> Vec<String> {
    strings(&[
        "vancouver",
        "burnaby",
        "richmond",
        "surrey",
        "coquitlam",
        "new westminster",
        "white rock",
        "delta",
        "langley",
        "maple ridge",
        "port coquitlam",
        "port moody",
        "north vancouver",
        "west vancouver",
    ])
}

fn default_neighborhoods() -> Vec<String> {
    strings(&[
        "downtown",
        "westside",
        "eastside",
        "kitsilano",
        "point grey",
        "dunbar",
        "kerrisdale",
        "shaughnessy",
        "fairview",
        "mount pleasant",
        "strathcona",
        "chinatown",
        "gastown",
        "yaletown",
        "coal harbour",
        "west end",
        "english bay",
    ])
}

fn default_amenities() -> Vec<String> {
    strings(&[
        "school",
        "park",
        "restaurant",
        "gym",
        "parking",
        "transit",
        "shopping",
        "grocery",
        "beach",
        "ocean",
        "mountain",
        "view",
        "balcony",
        "laundry",
        "dishwasher",
        "air conditioning",
        "pet",
        "dog",
        "cat",
        "furnished",
        "unfurnished",
        "utilities",
        "wifi",
        "internet",
    ])
}

fn default_name_stopwords() -> Vec<String> {
    strings(&[
        "a", "an", "the", "in", "at", "on", "to", "for", "from", "with", "and", "not", "so",
        "just", "very", "really", "looking", "interested", "moving", "planning", "trying",
        "searching", "thinking", "hoping", "wanting", "renting", "buying", "currently", "also",
        "here", "good", "fine", "great", "ok", "okay", "new", "still", "ready", "excited",
        "sure", "free", "available", "living", "working", "going", "relocating", "flexible",
        "asap", "anytime", "back", "later", "today", "tomorrow", "sorry", "open", "doing",
    ])
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            cities: default_cities(),
            neighborhoods: default_neighborhoods(),
            amenities: default_amenities(),
            name_stopwords: default_name_stopwords(),
        }
    }
}

impl VocabularyConfig {
    pub fn is_name_stopword(&self, word: &str) -> bool {
        self.name_stopwords.iter().any(|s| s.eq_ignore_ascii_case(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let vocab: VocabularyConfig = serde_yaml::from_str("cities: [victoria]\n").unwrap();
        assert_eq!(vocab.cities, vec!["victoria".to_string()]);
        assert!(vocab.neighborhoods.contains(&"kitsilano".to_string()));
        assert!(vocab.amenities.contains(&"gym".to_string()));
    }

    #[test]
    fn test_name_stopwords() {
        let vocab = VocabularyConfig::default();
        assert!(vocab.is_name_stopword("Looking"));
        assert!(!vocab.is_name_stopword("bob"));
    }
}
