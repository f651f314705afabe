// src/analyze/jsonld.rs
// =============================================================================
// Collects schema.org types (Article, Product, Organization, ...) declared in
// JSON-LD <script> blocks. Nested objects and @graph arrays are walked too.
// =============================================================================

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// At most this many distinct types are reported per page
const MAX_TYPES: usize = 10;

pub fn extract_jsonld_types(document: &Html) -> Vec<String> {
    // Constant selector, known to be valid
    let selector = Selector::parse("script[type]").unwrap();
    let mut types = Vec::new();

    for script in document.select(&selector) {
        let is_jsonld = script
            .value()
            .attr("type")
            .map(|t| t.to_ascii_lowercase().contains("ld+json"))
            .unwrap_or(false);
        if !is_jsonld {
            continue;
        }

        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => collect_types(&value, &mut types),
            Err(e) => debug!("Skipping invalid JSON-LD block: {}", e),
        }
    }

    let mut unique: Vec<String> = Vec::new();
    for t in types {
        let t = t.trim().to_string();
        if !t.is_empty() && !unique.contains(&t) {
            unique.push(t);
        }
    }
    unique.truncate(MAX_TYPES);
    unique
}

fn collect_types(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => out.push(t.clone()),
                Some(Value::Array(list)) => out.extend(list.iter().map(|t| match t {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })),
                _ => {}
            }
            for child in map.values() {
                collect_types(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_types(item, out);
            }
        }
        _ => {}
    }
}
