//! Lead Scoring
//!
//! Additive 0-10 score over a [`LeadRecord`]:
//!
//! | Signal                                        | Points |
//! |-----------------------------------------------|--------|
//! | name, email, phone                            | +1 each |
//! | rent/buy, area, any amenity                   | +1 each |
//! | budget naming a high-end figure (500k/750k/1M)| +2     |
//! | any other budget                              | +1     |
//! | immediate urgency (asap/immediate/urgent/soon)| +2     |
//! | any other urgency                             | +1     |
//!
//! The total is clamped to 10. Bands for the admin view come from [`ScoreBand`].

use roy_core::{LeadRecord, ScoreBand};

/// Maximum lead score
pub const MAX_SCORE: u8 = 10;

/// Budget markers that earn the high-budget bonus
const HIGH_BUDGET_MARKERS: [&str; 3] = ["500k", "750k", "1m"];

/// Score a lead record
pub fn score(record: &LeadRecord) -> u8 {
    let contact = [
        record.name.is_some(),
        record.email.is_some(),
        record.phone.is_some(),
        record.rent_or_buy.is_some(),
        record.area.is_some(),
        !record.amenities.is_empty(),
    ]
    .iter()
    .filter(|present| **present)
    .count() as u8;

    let budget = match &record.budget_range {
        Some(budget) if is_high_budget(budget) => 2,
        Some(_) => 1,
        None => 0,
    };

    let urgency = match record.urgency {
        Some(urgency) if urgency.is_immediate() => 2,
        Some(_) => 1,
        None => 0,
    };

    (contact + budget + urgency).min(MAX_SCORE)
}

/// Score and band in one call
pub fn score_with_band(record: &LeadRecord) -> (u8, ScoreBand) {
    let s = score(record);
    (s, ScoreBand::from_score(s))
}

fn is_high_budget(budget: &str) -> bool {
    let lower = budget.to_lowercase();
    HIGH_BUDGET_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roy_core::{RentOrBuy, Urgency};

    fn full_record() -> LeadRecord {
        LeadRecord::new()
            .with_name("Alice")
            .with_email("alice@example.com")
            .with_phone("604-555-1234")
            .with_rent_or_buy(RentOrBuy::Buy)
            .with_area("kitsilano")
            .with_amenity("park")
            .with_budget_range("$750k")
            .with_urgency(Urgency::Asap)
    }

    #[test]
    fn test_empty_record_scores_zero() {
        assert_eq!(score(&LeadRecord::new()), 0);
    }

    #[test]
    fn test_full_record_scores_ten() {
        assert_eq!(score(&full_record()), 10);
        assert_eq!(score_with_band(&full_record()).1, ScoreBand::High);
    }

    #[test]
    fn test_budget_points() {
        let base = LeadRecord::new();
        assert_eq!(score(&base.clone().with_budget_range("$500k-$750k")), 2);
        assert_eq!(score(&base.clone().with_budget_range("$1M")), 2);
        assert_eq!(score(&base.clone().with_budget_range("$2,000/month")), 1);
    }

    #[test]
    fn test_urgency_points() {
        let base = LeadRecord::new();
        assert_eq!(score(&base.clone().with_urgency(Urgency::Soon)), 2);
        assert_eq!(score(&base.clone().with_urgency(Urgency::Urgent)), 2);
        assert_eq!(score(&base.clone().with_urgency(Urgency::Flexible)), 1);
        assert_eq!(score(&base.with_urgency(Urgency::WithinThreeMonths)), 1);
    }

    #[test]
    fn test_score_is_bounded() {
        let mut record = full_record();
        for i in 0..20 {
            record = record.with_amenity(format!("amenity-{}", i));
            assert!(score(&record) <= MAX_SCORE);
        }
    }

    #[test]
    fn test_contact_only_band() {
        let record = LeadRecord::new()
            .with_name("Bob")
            .with_email("bob@x.com")
            .with_rent_or_buy(RentOrBuy::Rent)
            .with_area("downtown")
            .with_urgency(Urgency::Asap);
        assert_eq!(score_with_band(&record), (6, ScoreBand::Medium));
    }
}
