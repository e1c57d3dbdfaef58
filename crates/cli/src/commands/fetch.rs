use anyhow::{Context, Result};
use pagelift_core::api::ApiCredentials;
use pagelift_core::db::MigrationLayout;
use pagelift_core::services::{fetch_pages, read_url_list};

use crate::canonicalize_or_current;
use crate::commands::{connect, load_config_or_default, load_project_env, source_login};

/// Fetch staged pages for every URL in `urls.txt` from the source site.
pub fn fetch_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = MigrationLayout::new(&root_path);
    load_project_env(&layout);
    let config = load_config_or_default(&layout)?;

    let (user, pass) = source_login()?;
    let urls = read_url_list(&layout.urls_path)
        .with_context(|| format!("Failed to read URL list at {}", layout.urls_path.display()))?;

    let report = fetch_pages(&urls, &layout.pages_dir, |origin| {
        connect(&ApiCredentials::new(origin, user.as_str(), pass.as_str()), config.retry)
    })
    .with_context(|| format!("Failed to write pages under {}", layout.pages_dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Fetched {} of {} URLs into {}",
        report.saved.len(),
        urls.len(),
        layout.pages_dir.display()
    );
    for page in &report.saved {
        println!("  ✓ {} → {}", page.slug, page.path.display());
    }
    if !report.failures.is_empty() {
        println!();
        println!("Failed ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  ✗ {}: {}", failure.url, failure.reason);
        }
    }
    Ok(())
}
