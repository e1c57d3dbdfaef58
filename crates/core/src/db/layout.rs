use std::path::{Path, PathBuf};

/// Logical layout of a migration project on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
/// The CLI is responsible for actually creating directories and files based on
/// this layout.
#[derive(Debug, Clone)]
pub struct MigrationLayout {
    /// Root directory of the project.
    pub root: PathBuf,
    /// Directory for internal metadata (.pagelift).
    pub meta_dir: PathBuf,
    /// Path to the project config file (JSON).
    pub project_config_path: PathBuf,
    /// Path to the run history database.
    pub history_db_path: PathBuf,
    /// Optional icon vocabulary override (YAML).
    pub vocabulary_path: PathBuf,
    /// Staged source records, one JSON document per record.
    pub pages_dir: PathBuf,
    /// Image pool used for media uploads.
    pub images_dir: PathBuf,
    /// Icon catalog (CSV).
    pub icon_catalog_path: PathBuf,
    /// Migration ledger (JSON).
    pub ledger_path: PathBuf,
    /// Source URLs to fetch, one per line.
    pub urls_path: PathBuf,
}

impl MigrationLayout {
    /// Compute the default layout for a project rooted at `root`.
    ///
    /// This does *not* touch the filesystem.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".pagelift");
        let project_config_path = meta_dir.join("project.json");
        let history_db_path = meta_dir.join("history.db");
        let vocabulary_path = meta_dir.join("vocabulary.yaml");
        let pages_dir = root.join("pages");
        let images_dir = root.join("images");
        let icon_catalog_path = root.join("icon_files.csv");
        let ledger_path = root.join("created_pages.json");
        let urls_path = root.join("urls.txt");

        Self {
            root,
            meta_dir,
            project_config_path,
            history_db_path,
            vocabulary_path,
            pages_dir,
            images_dir,
            icon_catalog_path,
            ledger_path,
            urls_path,
        }
    }

    /// History database path suitable for storing in `ProjectConfig`,
    /// relative to `root` when possible.
    pub fn history_path_relative_string(&self) -> String {
        match self.history_db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.history_db_path.to_string_lossy().to_string(),
        }
    }

    /// Path of the staged document for origin id `id`.
    pub fn page_path(&self, id: &str) -> PathBuf {
        self.pages_dir.join(format!("{id}.json"))
    }
}
