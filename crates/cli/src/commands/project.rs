use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pagelift_core::db::{MigrationLayout, ProjectConfig, RunHistoryDb};
use pagelift_core::icons::IconLibrary;
use pagelift_core::ledger::Ledger;
use serde::Serialize;

use crate::commands::{load_config_or_default, print_dir_status, print_file_status};
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub initialized: bool,
    pub config_file: String,
    pub config_version: String,
    pub history_path: String,
    pub settings: pagelift_core::db::MigrationSettings,
    pub retry: pagelift_core::http::RetryPolicy,
    pub layout: ProjectInfoLayout,
    pub counts: ProjectCounts,
}

#[derive(Serialize)]
pub struct ProjectInfoLayout {
    pub meta_dir: String,
    pub pages_dir: String,
    pub images_dir: String,
    pub icon_catalog: String,
    pub ledger: String,
    pub urls: String,
}

#[derive(Serialize)]
pub struct ProjectCounts {
    pub staged_pages: usize,
    pub images: usize,
    pub icons: usize,
    pub ledger_entries: usize,
    pub runs: usize,
}

/// Initialize a new migration project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = MigrationLayout::new(&root_path);

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.pages_dir)
        .with_context(|| format!("Failed to create pages dir: {}", layout.pages_dir.display()))?;
    fs::create_dir_all(&layout.images_dir)
        .with_context(|| format!("Failed to create images dir: {}", layout.images_dir.display()))?;

    let config = ProjectConfig::new(&project_name, layout.history_path_relative_string());
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the history database immediately so follow-on commands (and tests)
    // can rely on its presence.
    RunHistoryDb::open(&layout.history_db_path).with_context(|| {
        format!("Failed to initialize run history database at {}", layout.history_db_path.display())
    })?;

    println!("Initialized pagelift project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  History DB (relative): {}", config.history.path);
    println!("  Pages dir: {}", layout.pages_dir.display());
    println!("  Images dir: {}", layout.images_dir.display());
    println!();
    println!("Next: list source URLs in {} and run `pagelift fetch`.", layout.urls_path.display());

    Ok(())
}

/// Show basic information about a project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = MigrationLayout::new(&root_path);
    let initialized = layout.project_config_path.exists();
    let config = load_config_or_default(&layout)?;

    let ledger = Ledger::load(&layout.ledger_path)
        .with_context(|| format!("Failed to read ledger at {}", layout.ledger_path.display()))?;
    let runs = if layout.history_db_path.exists() {
        RunHistoryDb::open(&layout.history_db_path)
            .and_then(|db| db.list_runs(None))
            .map(|runs| runs.len())
            .unwrap_or_default()
    } else {
        0
    };
    let counts = ProjectCounts {
        staged_pages: count_files(&layout.pages_dir, "json"),
        images: count_files(&layout.images_dir, "webp"),
        icons: if layout.icon_catalog_path.exists() {
            IconLibrary::load_or_empty(&layout.icon_catalog_path).len()
        } else {
            0
        },
        ledger_entries: ledger.len(),
        runs,
    };

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: config.name.clone(),
            root: layout.root.display().to_string(),
            initialized,
            config_file: layout.project_config_path.display().to_string(),
            config_version: config.config_version.clone(),
            history_path: config.history.path.clone(),
            settings: config.settings.clone(),
            retry: config.retry,
            layout: ProjectInfoLayout {
                meta_dir: layout.meta_dir.display().to_string(),
                pages_dir: layout.pages_dir.display().to_string(),
                images_dir: layout.images_dir.display().to_string(),
                icon_catalog: layout.icon_catalog_path.display().to_string(),
                ledger: layout.ledger_path.display().to_string(),
                urls: layout.urls_path.display().to_string(),
            },
            counts,
        };
        let serialized = serde_json::to_string_pretty(&snapshot)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("pagelift Project Info");
    println!("=====================");
    println!("Name: {}", config.name);
    println!("Root: {}", layout.root.display());
    if initialized {
        println!("Config file: {}", layout.project_config_path.display());
    } else {
        println!("Config file: (not initialized; using defaults)");
    }
    println!("Config version: {}", config.config_version);
    println!("History DB (config): {}", config.history.path);
    println!(
        "Settings: test_mode={} upload_new_images={} clear_interlinking={} page_category={}",
        config.settings.test_mode,
        config.settings.upload_new_images,
        config.settings.clear_interlinking_metadata,
        config.settings.page_category
    );
    println!(
        "Retry: {} attempts, {}ms initial delay",
        config.retry.max_attempts, config.retry.initial_delay_ms
    );
    println!();

    println!("Paths:");
    print_dir_status("Meta dir (.pagelift)", &layout.meta_dir);
    print_dir_status("Pages dir", &layout.pages_dir);
    print_dir_status("Images dir", &layout.images_dir);
    print_file_status("Icon catalog", &layout.icon_catalog_path);
    print_file_status("Ledger", &layout.ledger_path);
    print_file_status("URL list", &layout.urls_path);
    println!();

    println!("Staged pages: {}", counts.staged_pages);
    println!("Images: {}", counts.images);
    println!("Icons: {}", counts.icons);
    println!("Ledger entries: {}", counts.ledger_entries);
    println!("Recorded runs: {}", counts.runs);

    Ok(())
}

fn count_files(dir: &Path, extension: &str) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == extension))
        .count()
}
