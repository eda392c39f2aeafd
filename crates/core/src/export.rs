//! CSV and plain-text export
//!
//! CSV output follows RFC 4180: CRLF record separators, and any field containing a comma,
//! double quote, CR or LF is wrapped in double quotes with inner quotes doubled.

use crate::conversation::Transcript;
use crate::lead::StoredLead;
use crate::listing::Listing;

const LINE_END: &str = "\r\n";

/// Lead columns, in fixed order
pub const LEAD_HEADERS: [&str; 12] = [
    "Name",
    "Email",
    "Phone",
    "Rent/Buy",
    "Area",
    "Budget Range",
    "Urgency",
    "Lead Score",
    "Status",
    "Phone Call Made",
    "Created Date",
    "Updated Date",
];

pub const TRANSCRIPT_HEADERS: [&str; 3] = ["Role", "Content", "Timestamp"];

pub const LISTING_HEADERS: [&str; 8] = [
    "Title",
    "Price",
    "Location",
    "Bedrooms",
    "Bathrooms",
    "Type",
    "Amenities",
    "URL",
];

/// Quote a single field if it needs it
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let row = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&row);
    out.push_str(LINE_END);
}

/// Render leads as CSV
pub fn leads_csv(leads: &[StoredLead]) -> String {
    let mut out = String::new();
    write_row(&mut out, &LEAD_HEADERS);
    for lead in leads {
        let r = &lead.record;
        write_row(
            &mut out,
            &[
                r.name.clone().unwrap_or_default(),
                r.email.clone().unwrap_or_default(),
                r.phone.clone().unwrap_or_default(),
                r.rent_or_buy.map(|v| v.as_str().to_string()).unwrap_or_default(),
                r.area.clone().unwrap_or_default(),
                r.budget_range.clone().unwrap_or_default(),
                r.urgency.map(|v| v.as_str().to_string()).unwrap_or_default(),
                lead.score.to_string(),
                lead.status.as_str().to_string(),
                if lead.call_made { "Yes" } else { "No" }.to_string(),
                lead.created_at.format("%Y-%m-%d").to_string(),
                lead.updated_at.format("%Y-%m-%d").to_string(),
            ],
        );
    }
    out
}

/// Render a transcript as CSV
pub fn transcript_csv(transcript: &Transcript) -> String {
    let mut out = String::new();
    write_row(&mut out, &TRANSCRIPT_HEADERS);
    for message in transcript.iter() {
        write_row(
            &mut out,
            &[
                message.role.as_str().to_string(),
                message.content.clone(),
                message.timestamp.to_rfc3339(),
            ],
        );
    }
    out
}

/// Render listings as CSV; amenities are joined with `; `
pub fn listings_csv(listings: &[Listing]) -> String {
    let mut out = String::new();
    write_row(&mut out, &LISTING_HEADERS);
    for listing in listings {
        write_row(
            &mut out,
            &[
                listing.title.clone(),
                listing.price.clone(),
                listing.location.clone(),
                listing.bedrooms.to_string(),
                listing.bathrooms.to_string(),
                listing.property_type.clone(),
                listing.amenities.join("; "),
                listing.url.clone(),
            ],
        );
    }
    out
}

/// Visitor-facing download: `You:` / `Roy:` blocks separated by blank lines
pub fn transcript_text(transcript: &Transcript) -> String {
    transcript
        .iter()
        .map(|m| format!("{}: {}", m.role.download_label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;
    use crate::lead::{LeadRecord, RentOrBuy, Urgency};

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_leads_csv_column_order() {
        let record = LeadRecord::new()
            .with_name("Bob")
            .with_email("bob@x.com")
            .with_rent_or_buy(RentOrBuy::Rent)
            .with_area("Burnaby, BC")
            .with_budget_range("$2,000-$3,000/month")
            .with_urgency(Urgency::Asap);
        let mut lead = StoredLead::new("L1", record);
        lead.score = 8;
        lead.call_made = true;

        let csv = leads_csv(&[lead]);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "Name,Email,Phone,Rent/Buy,Area,Budget Range,Urgency,Lead Score,Status,Phone Call Made,Created Date,Updated Date"
        );
        assert!(lines[1].starts_with(
            "Bob,bob@x.com,,rent,\"Burnaby, BC\",\"$2,000-$3,000/month\",asap,8,new,Yes,"
        ));
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_transcript_text() {
        let transcript = Transcript::from(vec![
            Message::assistant("Hey there!"),
            Message::user("Hi Roy"),
        ]);
        assert_eq!(transcript_text(&transcript), "Roy: Hey there!\n\nYou: Hi Roy");

        let csv = transcript_csv(&transcript);
        assert!(csv.starts_with("Role,Content,Timestamp\r\nassistant,Hey there!,"));
    }
}
