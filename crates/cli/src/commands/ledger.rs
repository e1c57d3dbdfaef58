use anyhow::{Context, Result};
use pagelift_core::db::MigrationLayout;
use pagelift_core::ledger::Ledger;

use crate::canonicalize_or_current;

/// List ledger entries.
pub fn list_ledger_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = MigrationLayout::new(&root_path);
    let ledger = Ledger::load(&layout.ledger_path)
        .with_context(|| format!("Failed to read ledger at {}", layout.ledger_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(ledger.records())?);
        return Ok(());
    }

    if ledger.is_empty() {
        println!("No migrated records in {}", layout.ledger_path.display());
        return Ok(());
    }

    println!("Migrated records ({}):", ledger.len());
    for record in ledger.records() {
        let media = if record.media_field_id_by_name.is_empty() {
            "no media".to_string()
        } else {
            format!("{} media", record.media_field_id_by_name.len())
        };
        println!(
            "- {} [origin {} → {}] {} ({})",
            record.title, record.origin_id, record.destination_id, record.url, media
        );
    }
    Ok(())
}
