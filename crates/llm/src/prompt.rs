//! Prompt Building
//!
//! Constructs Roy's prompt: a fixed persona, the rental knowledge base, and a per-turn status
//! block listing the lead fields already collected (✅) and still missing (❌).

use std::fmt::Write as _;

use roy_core::{LeadField, LeadRecord, Listing};

const PERSONA: &str = "\
You are {name}, a real estate broker with over 15 years of experience helping people find their \
home in the Greater Vancouver area. You are warm, professional and know the local market inside out.

You are a human broker. If anyone asks whether you are an AI or a bot, say you are {name} and \
make a light joke about your day of showings.

Your personality:
- Approachable, like a trusted friend, but never stuffy
- Patient and thorough about understanding what the client needs
- Knowledgeable about neighbourhoods, schools, amenities and market trends
- Adapt your tone to the client; casual clients get a more casual reply
- Now and then share a short funny story from a showing

Your goals:
1. Build rapport quickly
2. Collect every piece of required information listed below
3. Ask specific questions for whatever is still missing
4. Share useful insight about neighbourhoods and the market
5. Suggest listings from the knowledge base when they fit
6. Gather everything within {call_threshold} messages; {max_messages} is the hard limit. Suggest a \
phone call once you have enough information or the conversation approaches {call_threshold} messages

REQUIRED INFORMATION:
1. NAME: \"What's your name?\"
2. EMAIL: \"What's the best email to send listings to?\"
3. PHONE: \"What's the best number to reach you?\"
4. RENT_OR_BUY: \"Are you looking to rent or buy?\" (rent or buy)
5. AREA: \"Which area or neighbourhood are you interested in?\"
6. AMENITIES: \"Which amenities matter to you?\" (schools, parks, gym, parking...)
7. BUDGET_RANGE: \"What's your budget range?\" (e.g. \"$2000-$3000/month\" or \"$500k-$750k\")
8. URGENCY: \"How soon do you need to move?\" (asap, within 3 months, flexible...)

CONVERSATION STRATEGY:
- Ask ONE question at a time
- Acknowledge every piece of information the client gives you
- If they ask for listings before you have the details, say you'd love to show them some places \
but need a few more details first
- Use short acknowledgements such as \"Perfect!\", \"Got it!\" or \"That's helpful!\"
- Break long answers into a few short messages";

/// Roy's prompt, rendered fresh for every turn
#[derive(Debug, Clone)]
pub struct RoyPrompt {
    agent_name: String,
    max_messages: usize,
    call_threshold: usize,
    listings: Vec<Listing>,
}

impl RoyPrompt {
    pub fn new(agent_name: impl Into<String>, max_messages: usize, call_threshold: usize) -> Self {
        Self {
            agent_name: agent_name.into(),
            max_messages,
            call_threshold,
            listings: Vec::new(),
        }
    }

    /// Attach the rental knowledge base
    pub fn with_listings(mut self, listings: Vec<Listing>) -> Self {
        self.listings = listings;
        self
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Persona and knowledge base, without per-turn status
    pub fn persona(&self) -> String {
        let mut out = PERSONA
            .replace("{name}", &self.agent_name)
            .replace("{max_messages}", &self.max_messages.to_string())
            .replace("{call_threshold}", &self.call_threshold.to_string());

        if !self.listings.is_empty() {
            out.push_str("\n\nRENTAL LISTINGS KNOWLEDGE BASE:\n");
            out.push_str(
                "When a listing fits, mention its title, price, key amenities and why it suits the client.\n",
            );
            for listing in &self.listings {
                let _ = writeln!(
                    out,
                    "- {} | {} | {} | {} bed, {} bath | Amenities: {}",
                    listing.title,
                    listing.price,
                    listing.location,
                    listing.bedrooms,
                    listing.bathrooms,
                    listing.amenities.join(", ")
                );
            }
        }
        out
    }

    /// Full prompt for one turn
    pub fn render(&self, known: &LeadRecord, message_count: usize) -> String {
        let mut out = self.persona();

        out.push_str("\n\nCURRENT LEAD INFORMATION COLLECTED:\n");
        for (field, value) in known.known_fields() {
            let _ = writeln!(out, "✅ {}: {}", field.key(), value);
        }

        out.push_str("\nMISSING INFORMATION NEEDED:\n");
        for field in LeadField::ALL.iter().filter(|f| !known.has(**f)) {
            let _ = writeln!(out, "❌ {}", field.prompt_label());
        }

        let _ = write!(
            out,
            "\nCurrent message count: {}/{}\n\n\
             INSTRUCTIONS:\n\
             - Ask for the missing information ONE question at a time\n\
             - If the message count approaches {} or you have enough information, suggest a phone call",
            message_count, self.max_messages, self.call_threshold
        );
        out
    }
}

impl Default for RoyPrompt {
    fn default() -> Self {
        Self::new("Roy", 40, 30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roy_core::RentOrBuy;

    #[test]
    fn test_status_block() {
        let known = LeadRecord::new()
            .with_name("Bob")
            .with_rent_or_buy(RentOrBuy::Rent);
        let prompt = RoyPrompt::default().render(&known, 7);

        assert!(prompt.contains("✅ name: Bob"));
        assert!(prompt.contains("✅ rentOrBuy: rent"));
        assert!(!prompt.contains("❌ NAME"));
        assert!(prompt.contains("❌ EMAIL"));
        assert!(prompt.contains("❌ URGENCY"));
        assert!(prompt.contains("Current message count: 7/40"));
    }

    #[test]
    fn test_missing_fields_in_order() {
        let prompt = RoyPrompt::default().render(&LeadRecord::new(), 1);
        let name = prompt.find("❌ NAME").unwrap();
        let budget = prompt.find("❌ BUDGET_RANGE").unwrap();
        let urgency = prompt.find("❌ URGENCY").unwrap();
        assert!(name < budget && budget < urgency);
    }

    #[test]
    fn test_listings_in_persona() {
        let listing = Listing {
            id: "1".to_string(),
            title: "Garden suite".to_string(),
            price: "$1,700".to_string(),
            location: "Vancouver West".to_string(),
            bedrooms: 1,
            bathrooms: 1,
            property_type: "garden level".to_string(),
            amenities: vec!["near transit".to_string()],
            url: "https://example.com/1".to_string(),
        };
        let prompt = RoyPrompt::new("Roy", 40, 30).with_listings(vec![listing]);
        let persona = prompt.persona();
        assert!(persona.contains("Garden suite | $1,700 | Vancouver West | 1 bed, 1 bath"));
        assert!(persona.contains("within 30 messages; 40 is the hard limit"));
    }
}
