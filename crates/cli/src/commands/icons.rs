use anyhow::{Context, Result};
use pagelift_core::db::MigrationLayout;
use pagelift_core::services::sync_icon_catalog;

use crate::canonicalize_or_current;
use crate::commands::{connect, destination_credentials, load_config_or_default, load_project_env};

/// Write `icon_files.csv` from the destination's SVG media.
pub fn sync_icons_command(root: &str, force: bool, min_id: Option<u64>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = MigrationLayout::new(&root_path);
    load_project_env(&layout);
    let config = load_config_or_default(&layout)?;

    let credentials = destination_credentials()?;
    let api = connect(&credentials, config.retry);
    let sync = sync_icon_catalog(&api, &layout.icon_catalog_path, force, min_id).with_context(|| {
        format!("Failed to write icon catalog at {}", layout.icon_catalog_path.display())
    })?;

    if sync.written {
        println!(
            "Saved {} icons to {} ({} SVG items over {} pages)",
            sync.rows,
            layout.icon_catalog_path.display(),
            sync.fetched,
            sync.pages
        );
    } else {
        println!(
            "{} already exists; pass --force to rebuild it",
            layout.icon_catalog_path.display()
        );
    }
    Ok(())
}
