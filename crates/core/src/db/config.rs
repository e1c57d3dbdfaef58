use serde::{Deserialize, Serialize};

use crate::http::RetryPolicy;
use crate::payload::PayloadOptions;

/// Where the run history database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to the history database file (typically relative to project root).
    pub path: String,
}

impl HistoryConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Run configuration, constructed once and handed to the runner.
///
/// CLI flags override individual values for a single run; core logic never
/// reads process state to decide any of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSettings {
    /// Process only the first staged record.
    #[serde(default = "default_true")]
    pub test_mode: bool,
    /// Re-upload images even for records that already have media.
    #[serde(default)]
    pub upload_new_images: bool,
    /// Drop interlinking metadata from payloads.
    #[serde(default = "default_true")]
    pub clear_interlinking_metadata: bool,
    /// Taxonomy id assigned to every migrated record.
    #[serde(default = "default_page_category")]
    pub page_category: u64,
    /// Seed for image selection; unseeded runs draw from the OS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_seed: Option<u64>,
    /// Rewrite the ledger after every record instead of only at the end.
    #[serde(default = "default_true")]
    pub flush_ledger_each_record: bool,
}

fn default_true() -> bool {
    true
}

fn default_page_category() -> u64 {
    10
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            test_mode: true,
            upload_new_images: false,
            clear_interlinking_metadata: true,
            page_category: default_page_category(),
            image_seed: None,
            flush_ledger_each_record: true,
        }
    }
}

impl MigrationSettings {
    pub fn payload_options(&self) -> PayloadOptions {
        PayloadOptions {
            clear_interlinking_metadata: self.clear_interlinking_metadata,
            page_category: self.page_category,
        }
    }
}

/// Serializable configuration describing a migration project.
///
/// This lives at `.pagelift/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    #[serde(default)]
    pub description: Option<String>,
    /// Schema/config version. This is about the config format.
    pub config_version: String,
    /// Run history database.
    pub history: HistoryConfig,
    #[serde(default)]
    pub settings: MigrationSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and history path.
    pub fn new(name: impl Into<String>, history_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            history: HistoryConfig::new(history_path),
            settings: MigrationSettings::default(),
            retry: RetryPolicy::default(),
        }
    }
}
