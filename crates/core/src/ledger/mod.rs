//! Migration ledger: the durable origin-id → destination-id mapping that makes
//! repeated runs converge instead of duplicating records.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{MigrationError, MigrationResult};
use crate::model::IMAGE_FIELDS;

/// One migrated record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredLedgerRecord")]
pub struct LedgerRecord {
    pub origin_id: String,
    pub destination_id: String,
    pub title: String,
    pub url: String,
    /// Image field name → destination media id.
    #[serde(default)]
    pub media_field_id_by_name: BTreeMap<String, String>,
}

/// On-disk shape. Older ledgers name the destination `pageId` and keep each
/// image field's media id as a top-level key next to it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLedgerRecord {
    origin_id: String,
    #[serde(alias = "pageId")]
    destination_id: String,
    title: String,
    url: String,
    #[serde(default)]
    media_field_id_by_name: BTreeMap<String, String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<StoredLedgerRecord> for LedgerRecord {
    fn from(stored: StoredLedgerRecord) -> Self {
        let mut media = stored.media_field_id_by_name;
        for field in IMAGE_FIELDS {
            let legacy = match stored.extra.get(field) {
                Some(Value::String(id)) if !id.is_empty() => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => continue,
            };
            media.entry(field.to_string()).or_insert(legacy);
        }
        Self {
            origin_id: stored.origin_id,
            destination_id: stored.destination_id,
            title: stored.title,
            url: stored.url,
            media_field_id_by_name: media,
        }
    }
}

impl LedgerRecord {
    /// True when any of the fixed image fields has a recorded media id.
    pub fn has_existing_media(&self) -> bool {
        IMAGE_FIELDS.iter().any(|field| {
            self.media_field_id_by_name.get(*field).is_some_and(|id| !id.is_empty())
        })
    }

    /// Recorded media ids restricted to the fixed image fields.
    pub fn existing_media(&self) -> BTreeMap<String, String> {
        self.media_field_id_by_name
            .iter()
            .filter(|(field, id)| IMAGE_FIELDS.contains(&field.as_str()) && !id.is_empty())
            .map(|(field, id)| (field.clone(), id.clone()))
            .collect()
    }
}

/// In-memory copy of the ledger file; at most one entry per origin id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    path: PathBuf,
    records: Vec<LedgerRecord>,
}

impl Ledger {
    /// An empty ledger that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), records: Vec::new() }
    }

    /// Load the ledger at `path`; a missing file is an empty ledger.
    ///
    /// Should the file hold more than one entry for an origin id, the last
    /// one wins.
    pub fn load(path: impl Into<PathBuf>) -> MigrationResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::new(path));
        }
        let body = fs::read_to_string(&path).map_err(|err| ledger_error(&path, err))?;
        let entries: Vec<LedgerRecord> = if body.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&body).map_err(|err| ledger_error(&path, err))?
        };

        let mut ledger = Self::new(path);
        for entry in entries {
            if ledger.get(&entry.origin_id).is_some() {
                warn!(origin_id = %entry.origin_id, "duplicate ledger entry; keeping the last one");
            }
            ledger.upsert(entry);
        }
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, origin_id: &str) -> Option<&LedgerRecord> {
        self.records.iter().find(|record| record.origin_id == origin_id)
    }

    /// Insert or replace the entry for `record.origin_id`.
    ///
    /// Returns true when an existing entry was replaced. Replaced entries keep
    /// their position so the file stays in first-migrated order.
    pub fn upsert(&mut self, record: LedgerRecord) -> bool {
        match self.records.iter_mut().find(|existing| existing.origin_id == record.origin_id) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.records.push(record);
                false
            }
        }
    }

    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rewrite the ledger file.
    ///
    /// Writes a sibling temp file and renames it over the target, so a crash
    /// mid-write leaves the previous ledger intact.
    pub fn save(&self) -> MigrationResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| ledger_error(&self.path, err))?;
        }
        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|err| ledger_error(&self.path, err))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|err| ledger_error(&tmp_path, err))?;
        fs::rename(&tmp_path, &self.path).map_err(|err| ledger_error(&self.path, err))?;
        debug!(path = %self.path.display(), entries = self.records.len(), "ledger written");
        Ok(())
    }
}

fn ledger_error(path: &Path, err: impl std::fmt::Display) -> MigrationError {
    MigrationError::Ledger { path: path.to_path_buf(), message: err.to_string() }
}
