//! Embedded JSON-LD business metadata

use crate::extract::text::{clean_description, clean_text};
use scraper::{Html, Selector};
use serde_json::Value;

/// Schema types that describe an agent's business
const BUSINESS_TYPES: &[&str] = &["RealEstateAgent", "Organization", "LocalBusiness"];

/// Business fields read from a JSON-LD block, already cleaned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessBlock {
    pub name: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// Collects every JSON-LD object on the page
///
/// Top-level arrays and `@graph` containers are flattened. Blocks that fail
/// to parse are skipped.
pub fn structured_blocks(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for script in document.select(&selector) {
        let content = script.text().collect::<String>();
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(content) {
            Ok(value) => flatten_into(value, &mut blocks),
            Err(e) => tracing::debug!("JSON-LD parse error: {}", e),
        }
    }

    blocks
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_into(graph, out);
            }
            if !map.is_empty() {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

/// Returns true when the object's `@type` names a business schema
pub fn is_business(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => BUSINESS_TYPES.contains(&kind.as_str()),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| BUSINESS_TYPES.contains(&kind)),
        _ => false,
    }
}

/// Finds the first business block on the page and reads its fields
pub fn find_business_block(document: &Html) -> Option<BusinessBlock> {
    let blocks = structured_blocks(document);
    let block = blocks.iter().find(|value| is_business(value))?;

    Some(BusinessBlock {
        name: string_field(block, "name").as_deref().and_then(clean_text),
        telephone: string_field(block, "telephone").as_deref().and_then(clean_text),
        email: string_field(block, "email").as_deref().and_then(clean_text),
        website: string_field(block, "url")
            .or_else(|| string_field(block, "website"))
            .as_deref()
            .and_then(clean_text),
        address: block.get("address").and_then(compose_address),
        description: string_field(block, "description")
            .as_deref()
            .and_then(clean_description),
    })
}

/// Reads a scalar field, taking the first entry when the field is a list
fn string_field(block: &Value, key: &str) -> Option<String> {
    scalar_string(block.get(key)?)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(scalar_string),
        _ => None,
    }
}

/// Address as a single line
///
/// A plain string is used verbatim; a postal address object is composed from
/// street, locality, and postcode when it has a street or locality at all.
fn compose_address(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(s),
        Value::Array(items) => items.iter().find_map(compose_address),
        Value::Object(_) => {
            let street = string_field(value, "streetAddress");
            let locality = string_field(value, "addressLocality");
            if street.is_none() && locality.is_none() {
                return None;
            }
            let postcode = string_field(value, "postalCode");
            let parts: Vec<String> = [street, locality, postcode]
                .into_iter()
                .flatten()
                .filter_map(|part| clean_text(&part))
                .collect();
            clean_text(&parts.join(", "))
        }
        _ => None,
    }
}
