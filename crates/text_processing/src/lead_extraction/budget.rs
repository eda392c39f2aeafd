//! Budget mention parsing and normalization
//!
//! A mention is a single amount or a range, optionally tagged as monthly. Normalization:
//! - monthly mentions, and anything at or below $1,000, render as rent: `$2,000-$3,000/month`
//! - everything else renders as a purchase price: `$650,000`, or `$500k-$750k` when the
//!   visitor used a `k`/`M` suffix

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Amounts at or below this are read as monthly rent
const RENT_CEILING: f64 = 1000.0;

const AMOUNT: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?";
const MONTHLY: &str = r"\s*(?:/\s?month|/\s?mo\b|/\s?mth|per month|a month|monthly|each month)";

fn amount(name: &str) -> String {
    format!(r"(?P<{name}>{AMOUNT})(?:\s?(?P<{name}_unit>k|m)\b)?")
}

fn monthly_tail(required: bool) -> String {
    if required {
        format!("(?P<monthly>{MONTHLY})")
    } else {
        format!("(?P<monthly>{MONTHLY})?")
    }
}

// Ordered: first pattern that matches anywhere wins
static BUDGET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let lo = amount("lo");
    let hi = amount("hi");
    [
        // $X-$Y, $Xk to $Yk
        format!(r"\$\s?{lo}\s*(?:-|–|to)\s*\$?\s?{hi}{}", monthly_tail(false)),
        // $X per month
        format!(r"\$\s?{lo}{}", monthly_tail(true)),
        // budget ... $X
        format!(r"budget[^$\d]{{0,40}}?\$\s?{lo}{}", monthly_tail(false)),
        // up to $X
        format!(r"up to[^$\d]{{0,20}}?\$\s?{lo}{}", monthly_tail(false)),
        // around $X
        format!(r"around[^$\d]{{0,20}}?\$\s?{lo}{}", monthly_tail(false)),
        // $X
        format!(r"\$\s?{lo}{}", monthly_tail(false)),
        // X dollars / bucks
        format!(r"\b{lo}\s*(?:dollars|bucks){}", monthly_tail(false)),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// One amount as the visitor wrote it
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    /// Value in dollars after applying any suffix
    pub dollars: f64,
    digits: String,
    suffix: Option<char>,
}

impl Amount {
    fn parse(digits: &str, suffix: Option<&str>) -> Option<Self> {
        let digits = digits.replace(',', "");
        let base: f64 = digits.parse().ok()?;
        let suffix = suffix.and_then(|s| s.chars().next());
        let dollars = match suffix {
            Some('k') => base * 1_000.0,
            Some('m') => base * 1_000_000.0,
            _ => base,
        };
        Some(Self {
            dollars,
            digits,
            suffix,
        })
    }

    /// `$2,500`
    fn render_full(&self) -> String {
        format!("${}", with_thousands(self.dollars.round() as u64))
    }

    /// `$500k` / `$1M` if a suffix was used, otherwise the full form
    fn render_compact(&self) -> String {
        match self.suffix {
            Some('k') => format!("${}k", self.digits),
            Some('m') => format!("${}M", self.digits),
            _ => self.render_full(),
        }
    }
}

/// Parsed budget mention
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetMention {
    pub low: Amount,
    pub high: Option<Amount>,
    /// Explicitly tagged as per-month
    pub monthly: bool,
}

impl BudgetMention {
    pub fn is_purchase(&self) -> bool {
        !self.monthly && self.low.dollars > RENT_CEILING
    }

    /// Canonical display string stored as the lead's budget range
    pub fn normalized(&self) -> String {
        if self.is_purchase() {
            match &self.high {
                Some(high) => format!("{}-{}", self.low.render_compact(), high.render_compact()),
                None => self.low.render_compact(),
            }
        } else {
            match &self.high {
                Some(high) => format!("{}-{}/month", self.low.render_full(), high.render_full()),
                None => format!("{}/month", self.low.render_full()),
            }
        }
    }
}

/// Find the first budget mention in lower-cased text
pub fn parse_budget(text: &str) -> Option<BudgetMention> {
    BUDGET_PATTERNS
        .iter()
        .find_map(|re| re.captures(text).and_then(|caps| mention_from(&caps)))
}

fn mention_from(caps: &Captures<'_>) -> Option<BudgetMention> {
    let low = Amount::parse(
        caps.name("lo")?.as_str(),
        caps.name("lo_unit").map(|m| m.as_str()),
    )?;
    let high = caps
        .name("hi")
        .and_then(|m| Amount::parse(m.as_str(), caps.name("hi_unit").map(|u| u.as_str())));
    // "$2-3k": the suffix on the upper bound applies to both
    let low = match (&high, low.suffix) {
        (Some(h), None) if h.suffix.is_some() && low.dollars < 10.0 => {
            let suffix = h.suffix.map(|c| c.to_string());
            Amount::parse(&low.digits, suffix.as_deref())?
        },
        _ => low,
    };
    Some(BudgetMention {
        low,
        high,
        monthly: caps.name("monthly").is_some(),
    })
}

/// Format an integer with comma thousands separators
pub fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(text: &str) -> Option<String> {
        parse_budget(text).map(|m| m.normalized())
    }

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(950), "950");
        assert_eq!(with_thousands(2000), "2,000");
        assert_eq!(with_thousands(1_250_000), "1,250,000");
    }

    #[test]
    fn test_monthly_range() {
        assert_eq!(
            normalized("somewhere between $2000-$3000/month please"),
            Some("$2,000-$3,000/month".to_string())
        );
        assert_eq!(
            normalized("$1,800 per month max"),
            Some("$1,800/month".to_string())
        );
    }

    #[test]
    fn test_small_amounts_are_rent() {
        assert_eq!(normalized("up to $900"), Some("$900/month".to_string()));
        assert_eq!(normalized("800 bucks"), Some("$800/month".to_string()));
    }

    #[test]
    fn test_purchase_prices() {
        assert_eq!(normalized("$500k-$750k"), Some("$500k-$750k".to_string()));
        assert_eq!(
            normalized("my budget is around $650k"),
            Some("$650k".to_string())
        );
        assert_eq!(normalized("maybe $1.2m"), Some("$1.2M".to_string()));
        assert_eq!(
            normalized("we could do $1,200,000"),
            Some("$1,200,000".to_string())
        );
        assert_eq!(normalized("$2000 to $3000"), Some("$2,000-$3,000".to_string()));
    }

    #[test]
    fn test_shared_suffix_on_range() {
        let mention = parse_budget("$2-3k a month").unwrap();
        assert_eq!(mention.low.dollars, 2000.0);
        assert_eq!(mention.normalized(), "$2,000-$3,000/month");
    }

    #[test]
    fn test_monthly_mention_beats_earlier_amount() {
        assert_eq!(
            normalized("parking is $50 extra. my budget tops out at $2,400 monthly"),
            Some("$2,400/month".to_string())
        );
    }

    #[test]
    fn test_no_mention() {
        assert!(parse_budget("call me at 604-555-1234").is_none());
        assert!(parse_budget("no idea yet").is_none());
    }
}
