use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

/// Stage of the per-record state machine at which a record stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStage {
    Loaded,
    IconsAssigned,
    PayloadBuilt,
    Created,
    Updated,
    ImagesHandled,
    ImagesSkipped,
    LedgerUpdated,
    Done,
    Failed,
}

impl RecordStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStage::Loaded => "loaded",
            RecordStage::IconsAssigned => "icons_assigned",
            RecordStage::PayloadBuilt => "payload_built",
            RecordStage::Created => "created",
            RecordStage::Updated => "updated",
            RecordStage::ImagesHandled => "images_handled",
            RecordStage::ImagesSkipped => "images_skipped",
            RecordStage::LedgerUpdated => "ledger_updated",
            RecordStage::Done => "done",
            RecordStage::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let stage = match value {
            "loaded" => RecordStage::Loaded,
            "icons_assigned" => RecordStage::IconsAssigned,
            "payload_built" => RecordStage::PayloadBuilt,
            "created" => RecordStage::Created,
            "updated" => RecordStage::Updated,
            "images_handled" => RecordStage::ImagesHandled,
            "images_skipped" => RecordStage::ImagesSkipped,
            "ledger_updated" => RecordStage::LedgerUpdated,
            "done" => RecordStage::Done,
            "failed" => RecordStage::Failed,
            _ => return None,
        };
        Some(stage)
    }
}

/// Error type for migration runs.
///
/// Only `Configuration` is fatal to a whole run; everything else is caught at
/// the record boundary and turned into a failed outcome.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Missing credentials or endpoint at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A staged record is missing required fields. Never retried.
    #[error("Malformed record {document}: {reason}")]
    MalformedInput { document: String, reason: String },

    /// A record's create/update or image step failed terminally.
    #[error("Record {origin_id} failed at {}: {message}", stage.as_str())]
    RecordFailed { origin_id: String, stage: RecordStage, message: String },

    /// Remote API failure (retries already exhausted).
    #[error(transparent)]
    Api(#[from] HttpError),

    #[error("Ledger error at {path}: {message}")]
    Ledger { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;
