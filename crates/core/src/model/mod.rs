//! Core data model: staged records, service entries, and icon resources.
//!
//! Staged records are the JSON documents fetched from the source API and
//! stored under `pages/`. They are read-only input; the only in-place
//! mutation the migration performs is writing assigned icon ids back into
//! the services block before the payload is built.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MigrationError;

/// Key of the repeatable services block inside the structured fields.
pub const SERVICES_FIELD: &str = "services_repeater";
/// Title key of a single service entry.
pub const SERVICE_TITLE_FIELD: &str = "service_title";
/// Icon key of a single service entry.
pub const SERVICE_ICON_FIELD: &str = "service_icon";

/// Image-bearing structured fields. These are never sent with the primary
/// create/update request; media ids are attached in a second update.
pub const IMAGE_FIELDS: [&str; 5] = [
    "image_text_section_1_image",
    "image_text_section_2_image",
    "image_text_section_3_image",
    "image_text_section_4_image",
    "about_us_image",
];

/// One icon resource available on the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconResource {
    /// Destination media id (unique within a run).
    pub id: u64,
    /// Icon name with the catalog prefix stripped (e.g. `shield-2`).
    pub canonical_name: String,
    pub source_file: String,
    pub source_url: String,
}

/// One item of a record's services block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Raw title; may contain markup.
    pub title: String,
    pub assigned_icon_id: Option<u64>,
}

impl ServiceEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), assigned_icon_id: None }
    }
}

/// A staged source record, the unit of migration.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    pub origin_id: String,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub body_content: String,
    /// Arbitrary nested mapping of custom fields.
    pub structured_fields: Map<String, Value>,
}

impl StagedRecord {
    /// Parse a staged record from the source API's page JSON.
    ///
    /// `source` names the document in error messages (usually the file name).
    pub fn from_json(source: &str, value: &Value) -> Result<Self, MigrationError> {
        let malformed = |reason: &str| MigrationError::MalformedInput {
            document: source.to_string(),
            reason: reason.to_string(),
        };

        let obj = value.as_object().ok_or_else(|| malformed("record is not a JSON object"))?;

        let origin_id = match obj.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(malformed("missing id")),
        };
        let title = rendered_text(obj.get("title")).ok_or_else(|| malformed("missing title"))?;
        let body_content =
            rendered_text(obj.get("content")).ok_or_else(|| malformed("missing content"))?;
        let slug = obj
            .get("slug")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed("missing slug"))?
            .to_string();
        let status = obj.get("status").and_then(Value::as_str).unwrap_or("draft").to_string();

        let structured_fields = match obj.get("acf") {
            Some(Value::Object(map)) => map.clone(),
            // The source API reports records without custom fields as `[]` or `false`.
            _ => Map::new(),
        };

        Ok(Self { origin_id, title, slug, status, body_content, structured_fields })
    }

    /// Image fields that carry a non-empty value in the source record, in
    /// the fixed `IMAGE_FIELDS` order.
    pub fn image_fields_with_values(&self) -> Vec<&'static str> {
        IMAGE_FIELDS
            .iter()
            .copied()
            .filter(|field| self.structured_fields.get(*field).is_some_and(is_truthy))
            .collect()
    }

    /// Read the services block, if present.
    pub fn services(&self) -> Vec<ServiceEntry> {
        let Some(Value::Array(items)) = self.structured_fields.get(SERVICES_FIELD) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| ServiceEntry {
                title: item
                    .get(SERVICE_TITLE_FIELD)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                assigned_icon_id: item.get(SERVICE_ICON_FIELD).and_then(Value::as_u64),
            })
            .collect()
    }

    /// Write assigned icon ids back into the services block.
    ///
    /// Entries with an empty title are left untouched, matching the matcher,
    /// which never visits them.
    pub fn apply_services(&mut self, services: &[ServiceEntry]) {
        let Some(Value::Array(items)) = self.structured_fields.get_mut(SERVICES_FIELD) else {
            return;
        };
        for (item, entry) in items.iter_mut().zip(services) {
            if entry.title.trim().is_empty() {
                continue;
            }
            if let Value::Object(obj) = item {
                let icon = entry.assigned_icon_id.map(Value::from).unwrap_or(Value::Null);
                obj.insert(SERVICE_ICON_FIELD.to_string(), icon);
            }
        }
    }
}

/// Extract `{"rendered": "..."}` or a plain string.
fn rendered_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("rendered").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Truthiness as the source API's front-end understands it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
