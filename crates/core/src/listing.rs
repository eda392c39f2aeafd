//! Property listing catalog entries

use serde::{Deserialize, Serialize};

/// Read-only catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// Display price such as `$1,700`
    pub price: String,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    #[serde(alias = "type")]
    pub property_type: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub url: String,
}

impl Listing {
    /// Numeric price with `$` and thousands separators stripped
    pub fn price_value(&self) -> Option<u64> {
        let digits: String = self
            .price
            .chars()
            .filter(|c| !matches!(c, '$' | ',' | ' '))
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}
