use serde_json::Value;
use tracing::{debug, warn};

use super::{ExtractionResult, Fields, Source};

pub const STRUCTURED_CONFIDENCE: f64 = 0.95;

const JOB_POSTING_TYPES: &[&str] = &[
    "JobPosting",
    "schema:JobPosting",
    "https://schema.org/JobPosting",
    "http://schema.org/JobPosting",
];

/// Parse a block as JSON, `None` on any syntax error.
pub fn try_parse(block: &str) -> Option<Value> {
    match serde_json::from_str(block.trim()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "skipping malformed JSON-LD block");
            None
        }
    }
}

/// First job posting across all blocks, in document order.
///
/// A posting whose title, company and location all come out empty does not
/// count as a match and the scan moves on.
pub fn parse_structured(blocks: &[String]) -> Option<ExtractionResult> {
    blocks
        .iter()
        .filter_map(|b| try_parse(b))
        .find_map(|v| find_posting(&v))
        .map(|fields| {
            debug!(job_title = %fields.job_title, company = %fields.company, "structured match");
            ExtractionResult::from_fields(fields, STRUCTURED_CONFIDENCE, Source::Structured)
        })
}

fn find_posting(value: &Value) -> Option<Fields> {
    match value {
        Value::Array(items) => items.iter().find_map(find_posting),
        Value::Object(map) => {
            if is_job_posting(map.get("@type")) {
                let fields = posting_fields(value);
                if !fields.is_empty() {
                    return Some(fields);
                }
            }
            map.get("@graph").and_then(find_posting)
        }
        _ => None,
    }
}

fn is_job_posting(type_tag: Option<&Value>) -> bool {
    match type_tag {
        Some(Value::String(t)) => JOB_POSTING_TYPES.contains(&t.as_str()),
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(Value::as_str)
            .any(|t| JOB_POSTING_TYPES.contains(&t)),
        _ => false,
    }
}

fn posting_fields(posting: &Value) -> Fields {
    let title = str_field(posting, "title");
    let company = organization_name(posting.get("hiringOrganization"));
    let location = location_text(posting.get("jobLocation"));
    Fields::bounded(&title, &company, &location)
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn organization_name(org: Option<&Value>) -> String {
    match org {
        Some(Value::String(name)) => name.clone(),
        Some(org @ Value::Object(_)) => {
            let name = str_field(org, "name");
            if name.trim().is_empty() {
                str_field(org, "legalName")
            } else {
                name
            }
        }
        _ => String::new(),
    }
}

fn location_text(location: Option<&Value>) -> String {
    let place = match location {
        Some(Value::Array(places)) => places.first(),
        other => other,
    };
    let Some(place) = place else {
        return String::new();
    };
    if let Value::String(text) = place {
        return text.clone();
    }

    let address = match place.get("address") {
        Some(Value::Array(addresses)) => addresses.first(),
        other => other,
    };
    match address {
        Some(Value::String(address)) => address.clone(),
        Some(address @ Value::Object(_)) => {
            let country = match address.get("addressCountry") {
                Some(Value::String(c)) => c.clone(),
                Some(c @ Value::Object(_)) => str_field(c, "name"),
                _ => String::new(),
            };
            [
                str_field(address, "addressLocality"),
                str_field(address, "addressRegion"),
                country,
            ]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
        }
        _ => String::new(),
    }
}
