use anyhow::{bail, Context, Result};
use pagelift_core::db::ProjectContext;

use crate::canonicalize_or_current;

/// List recorded runs, or one run's per-record outcomes.
pub fn history_command(
    root: &str,
    run: Option<i64>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;

    if let Some(run_id) = run {
        let outcomes = ctx.history.list_outcomes(run_id).context("Failed to list run outcomes")?;
        let known = ctx.history.list_runs(None)?.iter().any(|r| r.id == Some(run_id));
        if outcomes.is_empty() && !known {
            bail!("Run {run_id} not found");
        }
        if json {
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
            return Ok(());
        }
        println!("Run {run_id} ({} records):", outcomes.len());
        for outcome in &outcomes {
            let mode = outcome.mode.map(|m| m.as_str()).unwrap_or("-");
            let status = if outcome.success { "ok" } else { "FAILED" };
            let label = if outcome.title.is_empty() { &outcome.source } else { &outcome.title };
            println!(
                "  [{}] {} (origin {}) mode={} stage={} {}",
                outcome.position + 1,
                label,
                if outcome.origin_id.is_empty() { "?" } else { outcome.origin_id.as_str() },
                mode,
                outcome.stage.as_str(),
                status
            );
            if let Some(error) = &outcome.error {
                println!("      {error}");
            }
        }
        return Ok(());
    }

    let runs = ctx.history.list_runs(limit).context("Failed to list runs")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }
    if runs.is_empty() {
        println!("No migration runs recorded.");
        return Ok(());
    }
    println!("Migration runs:");
    for run in &runs {
        println!(
            "- #{} {} total={} ok={} failed={}{}",
            run.id.unwrap_or_default(),
            run.started_at,
            run.total,
            run.succeeded,
            run.failed,
            if run.test_mode { " (test mode)" } else { "" }
        );
    }
    Ok(())
}
