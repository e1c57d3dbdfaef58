use serde::{Deserialize, Serialize};

use crate::error::RecordStage;

/// Whether a record went down the create or the update path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    Create,
    Update,
}

impl RecordMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordMode::Create => "create",
            RecordMode::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "create" => Some(RecordMode::Create),
            "update" => Some(RecordMode::Update),
            _ => None,
        }
    }
}

/// One row of `migration_runs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    /// Row id; `None` before the run is stored.
    pub id: Option<i64>,
    pub started_at: String,
    pub finished_at: String,
    pub test_mode: bool,
    pub upload_new_images: bool,
    pub clear_interlinking_metadata: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// One row of `record_outcomes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// Zero-based processing position within the run.
    pub position: usize,
    /// Staged document name.
    pub source: String,
    /// Empty when the document could not be parsed far enough to know it.
    pub origin_id: String,
    pub title: String,
    /// `None` when the record failed before the ledger lookup.
    pub mode: Option<RecordMode>,
    /// Terminal stage: `done`, or the stage at which the record failed.
    pub stage: RecordStage,
    pub success: bool,
    pub destination_id: Option<String>,
    pub error: Option<String>,
}
