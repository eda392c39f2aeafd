//! Listing matching for renters
//!
//! Filters the catalog by the visitor's area, budget ceiling and amenities. Buyers get no
//! suggestions; the catalog only covers rentals.

use once_cell::sync::Lazy;
use regex::Regex;

use roy_core::{LeadRecord, Listing, RentOrBuy};

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Budget ceiling in dollars: the first digit run of the budget string, in thousands
///
/// `"$2,000-$3,000/month"` reads as 2 → $2,000.
pub fn budget_ceiling(budget_range: &str) -> Option<u64> {
    FIRST_NUMBER
        .find(budget_range)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(|n| n.saturating_mul(1000))
}

/// Listings suited to a lead, in catalog order, at most `max`
pub fn match_listings(record: &LeadRecord, catalog: &[Listing], max: usize) -> Vec<Listing> {
    if record.rent_or_buy != Some(RentOrBuy::Rent) {
        return Vec::new();
    }

    let area = record.area.as_deref().map(str::to_lowercase);
    let ceiling = record.budget_range.as_deref().and_then(budget_ceiling);
    let amenities: Vec<String> = record.amenities.iter().map(|a| a.to_lowercase()).collect();

    let matches: Vec<Listing> = catalog
        .iter()
        .filter(|listing| match &area {
            Some(area) => {
                listing.location.to_lowercase().contains(area)
                    || listing.title.to_lowercase().contains(area)
            },
            None => true,
        })
        .filter(|listing| match ceiling {
            Some(ceiling) => listing.price_value().is_some_and(|price| price <= ceiling),
            None => true,
        })
        .filter(|listing| {
            amenities.is_empty()
                || amenities.iter().any(|wanted| {
                    listing
                        .amenities
                        .iter()
                        .any(|have| have.to_lowercase().contains(wanted))
                })
        })
        .take(max)
        .cloned()
        .collect();

    tracing::debug!(
        catalog = catalog.len(),
        matched = matches.len(),
        area = ?area,
        ceiling = ?ceiling,
        "Matched listings"
    );
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, price: &str, location: &str, amenities: &[&str]) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Suite {}", id),
            price: price.to_string(),
            location: location.to_string(),
            bedrooms: 1,
            bathrooms: 1,
            property_type: "Apartment".to_string(),
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
            url: format!("https://example.com/{}", id),
        }
    }

    fn catalog() -> Vec<Listing> {
        vec![
            listing("1", "$1,800", "Metrotown, Burnaby", &["Gym", "In-suite laundry"]),
            listing("2", "$2,400", "Brentwood, Burnaby", &["Parking"]),
            listing("3", "$1,650", "Kitsilano, Vancouver", &["Near beach"]),
            listing("4", "$1,950", "Edmonds, Burnaby", &["Pet friendly"]),
            listing("5", "$1,500", "Highgate, Burnaby", &["Parking"]),
        ]
    }

    fn renter() -> LeadRecord {
        LeadRecord::new().with_rent_or_buy(RentOrBuy::Rent)
    }

    #[test]
    fn test_budget_ceiling() {
        assert_eq!(budget_ceiling("$2,000-$3,000/month"), Some(2000));
        assert_eq!(budget_ceiling("$3k"), Some(3000));
        assert_eq!(budget_ceiling("flexible"), None);
    }

    #[test]
    fn test_buyers_get_nothing() {
        let buyer = LeadRecord::new().with_rent_or_buy(RentOrBuy::Buy);
        assert!(match_listings(&buyer, &catalog(), 3).is_empty());
        assert!(match_listings(&LeadRecord::new(), &catalog(), 3).is_empty());
    }

    #[test]
    fn test_area_and_budget() {
        let record = renter()
            .with_area("Burnaby")
            .with_budget_range("$2000-$3000/month");
        let ids: Vec<String> = match_listings(&record, &catalog(), 3)
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["1", "4", "5"]);
    }

    #[test]
    fn test_amenity_substring() {
        let record = renter().with_amenity("parking");
        let ids: Vec<String> = match_listings(&record, &catalog(), 3)
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["2", "5"]);
    }

    #[test]
    fn test_truncates_in_catalog_order() {
        let ids: Vec<String> = match_listings(&renter(), &catalog(), 2)
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
