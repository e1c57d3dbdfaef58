//! Payload builder: turns a staged record into the body the destination API
//! accepts for create/update.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::model::{StagedRecord, IMAGE_FIELDS};

/// Internal-only icon reference; always dropped. `service_icon` is kept.
pub const DENYLISTED_KEY: &str = "icon";
/// Interlinking metadata; dropped when the run clears it.
pub const INTERLINKING_KEY: &str = "interlinks";
/// Synthetic flag controlling the destination's automatic interlinking.
pub const AUTO_INTERLINKING_FIELD: &str = "disable_automatic_interlinking";
/// Taxonomy field assigned to every migrated record.
pub const CATEGORY_FIELD: &str = "page-category";

/// Knobs the builder takes from the run settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadOptions {
    pub clear_interlinking_metadata: bool,
    pub page_category: u64,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self { clear_interlinking_metadata: true, page_category: 10 }
    }
}

/// Recursively clean structured fields.
///
/// Drops the denylisted key everywhere, drops the interlinking key when
/// `clear_interlinking` is set, and turns empty strings into `null` so the
/// destination sees "cleared" rather than "absent". Applying it to its own
/// output changes nothing.
pub fn sanitize_fields(value: &Value, clear_interlinking: bool) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items.iter().map(|item| sanitize_fields(item, clear_interlinking)).collect(),
        ),
        Value::Object(obj) => {
            let mut sanitized = Map::new();
            for (key, inner) in obj {
                if key == DENYLISTED_KEY || (clear_interlinking && key == INTERLINKING_KEY) {
                    continue;
                }
                let cleaned = match inner {
                    Value::String(s) if s.is_empty() => Value::Null,
                    Value::Array(_) | Value::Object(_) => {
                        sanitize_fields(inner, clear_interlinking)
                    }
                    other => other.clone(),
                };
                sanitized.insert(key.clone(), cleaned);
            }
            Value::Object(sanitized)
        }
        other => other.clone(),
    }
}

/// Build the create/update payload for `record`.
///
/// Image fields are stripped entirely; they are attached afterwards with
/// `media_payload` once the destination id is known.
pub fn build_payload(record: &StagedRecord, options: &PayloadOptions) -> Value {
    let fields = Value::Object(record.structured_fields.clone());
    let mut acf = match sanitize_fields(&fields, options.clear_interlinking_metadata) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for field in IMAGE_FIELDS {
        acf.remove(field);
    }
    acf.insert(AUTO_INTERLINKING_FIELD.to_string(), Value::Bool(false));

    json!({
        "title": record.title,
        "slug": record.slug,
        "status": record.status,
        "content": record.body_content,
        CATEGORY_FIELD: [options.page_category],
        "acf": acf,
    })
}

/// Second update carrying only the media-id fields.
///
/// Numeric ids are sent as numbers, which is what the destination's image
/// fields expect.
pub fn media_payload(media: &BTreeMap<String, String>) -> Value {
    let acf: Map<String, Value> = media
        .iter()
        .map(|(field, id)| {
            let value =
                id.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(id.as_str()));
            (field.clone(), value)
        })
        .collect();
    json!({ "acf": acf })
}
