use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::db::{open_history_db, MigrationLayout, ProjectConfig, RunHistoryDb};

/// Convenience wrapper bundling layout, config, history path, and an open history DB.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: MigrationLayout,
    pub config: ProjectConfig,
    pub history_path: PathBuf,
    pub history: RunHistoryDb,
}

impl ProjectContext {
    /// Load project config and open the history database for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = MigrationLayout::new(root);
        let (config, history_path, history) = open_history_db(&layout)?;
        Ok(Self { layout, config, history_path, history })
    }
}
