use anyhow::{Context, Result};
use pagelift_core::db::{resolve_history_path, MigrationLayout, MigrationSettings, RunHistoryDb};
use pagelift_core::icons::{IconLibrary, IconMatcher, IconVocabulary};
use pagelift_core::ledger::Ledger;
use pagelift_core::services::{
    load_staged_documents, sync_icon_catalog, ImagePool, MigrationRunner, RunReport,
};

use crate::canonicalize_or_current;
use crate::commands::{connect, destination_credentials, load_config_or_default, load_project_env};

/// Per-run overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct MigrateOverrides {
    /// Process every staged page instead of only the first.
    pub all: bool,
    pub upload_new_images: bool,
    pub keep_interlinks: bool,
    pub seed: Option<u64>,
}

impl MigrateOverrides {
    pub fn apply(&self, settings: &mut MigrationSettings) {
        if self.all {
            settings.test_mode = false;
        }
        if self.upload_new_images {
            settings.upload_new_images = true;
        }
        if self.keep_interlinks {
            settings.clear_interlinking_metadata = false;
        }
        if self.seed.is_some() {
            settings.image_seed = self.seed;
        }
    }
}

/// Migrate staged pages to the destination site.
pub fn migrate_command(root: &str, overrides: &MigrateOverrides, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = MigrationLayout::new(&root_path);
    load_project_env(&layout);
    let config = load_config_or_default(&layout)?;
    let mut settings = config.settings.clone();
    overrides.apply(&mut settings);

    // Missing credentials abort before any record is touched.
    let credentials = destination_credentials()?;
    let api = connect(&credentials, config.retry);

    if !json {
        println!("Configuration:");
        println!("  Destination: {}", credentials.base_url);
        println!("  Test mode: {}", settings.test_mode);
        println!("  Upload new images: {}", settings.upload_new_images);
        println!("  Clear interlinking: {}", settings.clear_interlinking_metadata);
        println!();
    }

    if !layout.icon_catalog_path.exists() {
        if let Err(err) = sync_icon_catalog(&api, &layout.icon_catalog_path, false, None) {
            tracing::warn!(error = %err, "icon catalog sync failed; continuing without icons");
        }
    }
    let library = IconLibrary::load_or_empty(&layout.icon_catalog_path);
    let vocabulary = IconVocabulary::load_or_builtin(&layout.vocabulary_path)?;
    let images = ImagePool::load(&layout.images_dir, settings.image_seed)
        .with_context(|| format!("Failed to read images under {}", layout.images_dir.display()))?;
    let ledger = Ledger::load(&layout.ledger_path)
        .with_context(|| format!("Failed to read ledger at {}", layout.ledger_path.display()))?;
    let documents = load_staged_documents(&layout.pages_dir).with_context(|| {
        format!("Failed to read staged pages under {}", layout.pages_dir.display())
    })?;

    let mut runner = MigrationRunner::new(
        &api,
        settings,
        library,
        IconMatcher::new(vocabulary),
        images,
        ledger,
    );
    let report = runner
        .run(&documents)
        .with_context(|| format!("Failed to write ledger at {}", layout.ledger_path.display()))?;

    let run_id = record_history(&layout, &report, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &layout, run_id);
    }
    Ok(())
}

/// Store the run in the history database. Failures are logged, not fatal.
fn record_history(
    layout: &MigrationLayout,
    report: &RunReport,
    config: &pagelift_core::db::ProjectConfig,
) -> Option<i64> {
    let history_path = resolve_history_path(layout, config);
    if let Some(parent) = history_path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            tracing::warn!(error = %err, "could not create history directory");
            return None;
        }
    }
    let (run, outcomes) = report.to_history();
    match RunHistoryDb::open(&history_path).and_then(|mut db| db.insert_run(&run, &outcomes)) {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!(error = %err, path = %history_path.display(), "run not recorded");
            None
        }
    }
}

fn print_report(report: &RunReport, layout: &MigrationLayout, run_id: Option<i64>) {
    if report.staged_total == 0 {
        println!("No staged pages found in {}", layout.pages_dir.display());
        return;
    }

    let total = report.outcomes.len();
    for outcome in &report.outcomes {
        let mode = outcome.mode.map(|m| m.as_str().to_uppercase()).unwrap_or_else(|| "-".into());
        if outcome.success {
            let url = outcome.record.as_ref().map(|r| r.url.as_str()).unwrap_or_default();
            let position = outcome.position + 1;
            println!("[{}/{}] ✓ {} ({}) {}", position, total, outcome.label(), mode, url);
        } else {
            println!("[{}/{}] ✗ {} ({})", outcome.position + 1, total, outcome.label(), mode);
        }
    }

    println!();
    println!("Migration complete");
    println!("  Succeeded: {}", report.succeeded());
    println!("  Failed: {}", report.failed());
    println!("  Ledger: {}", layout.ledger_path.display());
    if let Some(id) = run_id {
        println!("  Run id: {id}");
    }

    if report.failed() > 0 {
        println!();
        println!("Failed records:");
        for failure in report.failures() {
            let origin =
                if failure.origin_id.is_empty() { "?" } else { failure.origin_id.as_str() };
            let message = failure.error.as_deref().unwrap_or("unknown error");
            println!("  - {} (origin {}): {}", failure.label(), origin, message);
        }
    }

    println!();
    if report.settings.test_mode {
        println!("Test mode processed 1 of {} staged pages.", report.staged_total);
        println!("Check the result, then run `pagelift migrate --all` to migrate everything.");
    } else {
        println!(
            "Re-running updates existing pages in place; failed records can simply be retried."
        );
    }
}
