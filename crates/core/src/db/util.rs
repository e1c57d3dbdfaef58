use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{MigrationLayout, ProjectConfig, RunHistoryDb};

/// Load the project config JSON from disk for a given layout.
pub fn load_project_config(layout: &MigrationLayout) -> Result<ProjectConfig> {
    let config_json = std::fs::read_to_string(&layout.project_config_path).with_context(|| {
        format!("Failed to read project config at {}", layout.project_config_path.display())
    })?;
    let config: ProjectConfig =
        serde_json::from_str(&config_json).context("Failed to parse project config JSON")?;
    Ok(config)
}

/// Resolve the history DB path, respecting relative/absolute config.
pub fn resolve_history_path(layout: &MigrationLayout, config: &ProjectConfig) -> PathBuf {
    let config_path = Path::new(&config.history.path);
    if config_path.is_absolute() {
        config_path.to_path_buf()
    } else {
        layout.root.join(config_path)
    }
}

/// Load the project config and open its run history database.
pub fn open_history_db(layout: &MigrationLayout) -> Result<(ProjectConfig, PathBuf, RunHistoryDb)> {
    let config = load_project_config(layout)?;
    let history_path = resolve_history_path(layout, &config);
    let db = RunHistoryDb::open(&history_path).with_context(|| {
        format!("Failed to open run history database at {}", history_path.display())
    })?;
    Ok((config, history_path, db))
}
