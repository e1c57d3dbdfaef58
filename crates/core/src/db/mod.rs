//! Project layout, configuration, and the SQLite run history.
//!
//! - `MigrationLayout`: computed paths for the project's files and directories.
//! - `ProjectConfig` / `MigrationSettings`: serializable project metadata and
//!   the run configuration handed to the migration runner.
//! - `RunHistoryDb`: a small SQLite wrapper recording every migration run.

pub mod config;
pub mod context;
pub mod history;
pub mod layout;
pub mod models;
pub mod util;

pub use config::{HistoryConfig, MigrationSettings, ProjectConfig};
pub use context::ProjectContext;
pub use history::{HistoryError, HistoryResult, RunHistoryDb, CURRENT_SCHEMA_VERSION};
pub use layout::MigrationLayout;
pub use models::{OutcomeRecord, RecordMode, RunRecord};
pub use util::{load_project_config, open_history_db, resolve_history_path};
