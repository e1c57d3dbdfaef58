use std::fs;
use std::path::Path;

use assert_cmd::Command;
use pagelift_core::db::{MigrationLayout, ProjectConfig, RunHistoryDb};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const DESTINATION_VARS: [&str; 3] = ["STAGING_URL", "STAGING_USER", "STAGING_PASS"];

/// The binary with destination and source credentials scrubbed from the
/// environment, running inside `root` so no stray `.env` is picked up.
fn pagelift(root: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pagelift");
    cmd.current_dir(root);
    for var in DESTINATION_VARS.iter().chain(&["WP_USER", "WP_PASS"]) {
        cmd.env_remove(var);
    }
    cmd
}

fn init(root: &Path) {
    pagelift(root).args(["init", "--name", "Acme"]).assert().success();
}

/// Point the destination at a closed local port and make requests fail fast.
fn offline_destination(cmd: &mut Command) -> &mut Command {
    cmd.env("STAGING_URL", "http://127.0.0.1:9")
        .env("STAGING_USER", "editor")
        .env("STAGING_PASS", "secret")
}

fn write_fast_fail_config(root: &Path) {
    let layout = MigrationLayout::new(root);
    let mut config = ProjectConfig::new("Acme", layout.history_path_relative_string());
    config.retry.max_attempts = 1;
    config.retry.initial_delay_ms = 0;
    fs::write(&layout.project_config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
}

#[test]
fn init_creates_config_directories_and_history() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    pagelift(root)
        .args(["init", "--name", "Acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized pagelift project:"));

    let layout = MigrationLayout::new(root);
    assert!(layout.project_config_path.is_file());
    assert!(layout.history_db_path.is_file());
    assert!(layout.pages_dir.is_dir());
    assert!(layout.images_dir.is_dir());

    let config: ProjectConfig =
        serde_json::from_str(&fs::read_to_string(&layout.project_config_path).unwrap()).unwrap();
    assert_eq!(config.name, "Acme");
    assert!(config.settings.test_mode);
}

#[test]
fn info_reports_defaults_before_init() {
    let dir = tempdir().expect("tempdir");
    let output = pagelift(dir.path()).args(["info", "--json"]).output().expect("run info");
    assert!(output.status.success());

    let snapshot: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(snapshot["initialized"], false);
    assert_eq!(snapshot["settings"]["test_mode"], true);
    assert_eq!(snapshot["counts"]["ledger_entries"], 0);
}

#[test]
fn info_counts_staged_pages_and_ledger_entries() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);

    let layout = MigrationLayout::new(root);
    fs::write(layout.page_path("1"), "{}").unwrap();
    fs::write(layout.page_path("2"), "{}").unwrap();
    fs::write(layout.images_dir.join("a.webp"), "x").unwrap();
    fs::write(
        &layout.ledger_path,
        r#"[{"originId":"1","destinationId":"901","title":"About",
             "url":"https://dest.test/about/"}]"#,
    )
    .unwrap();

    let output = pagelift(root).args(["info", "--json"]).output().expect("run info");
    let snapshot: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(snapshot["name"], "Acme");
    assert_eq!(snapshot["initialized"], true);
    assert_eq!(snapshot["counts"]["staged_pages"], 2);
    assert_eq!(snapshot["counts"]["images"], 1);
    assert_eq!(snapshot["counts"]["ledger_entries"], 1);

    pagelift(root)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("pagelift Project Info"))
        .stdout(predicate::str::contains("Staged pages: 2"));
}

#[test]
fn ledger_lists_entries_or_says_it_is_empty() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    pagelift(root)
        .arg("ledger")
        .assert()
        .success()
        .stdout(predicate::str::contains("No migrated records"));

    fs::write(
        MigrationLayout::new(root).ledger_path,
        r#"[{"originId":"412","pageId":"901","title":"About","url":"https://dest.test/about/",
            "mediaFieldIdByName":{"about_us_image":"77"}}]"#,
    )
    .unwrap();

    pagelift(root)
        .arg("ledger")
        .assert()
        .success()
        .stdout(predicate::str::contains("Migrated records (1):"))
        .stdout(predicate::str::contains("origin 412 → 901"))
        .stdout(predicate::str::contains("1 media"));
}

#[test]
fn history_requires_an_initialized_project() {
    let dir = tempdir().expect("tempdir");
    pagelift(dir.path())
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read project config"));
}

#[test]
fn history_lists_runs_and_rejects_unknown_ids() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);

    pagelift(root)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No migration runs recorded."));

    pagelift(root)
        .args(["history", "--run", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Run 7 not found"));
}

#[test]
fn migrate_fails_fast_without_destination_credentials() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);
    fs::write(MigrationLayout::new(root).page_path("1"), "{}").unwrap();

    pagelift(root)
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Missing environment variables: STAGING_URL, STAGING_USER, STAGING_PASS",
        ));

    assert!(!MigrationLayout::new(root).ledger_path.exists());
}

#[test]
fn fetch_requires_source_credentials() {
    let dir = tempdir().expect("tempdir");
    pagelift(dir.path())
        .arg("fetch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing environment variables: WP_USER, WP_PASS"));
}

#[test]
fn migrate_with_nothing_staged_records_an_empty_run() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);
    let layout = MigrationLayout::new(root);
    fs::write(&layout.icon_catalog_path, "id,title,filename,url,alt_text\n").unwrap();

    let mut cmd = pagelift(root);
    offline_destination(&mut cmd)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No staged pages found"));

    let db = RunHistoryDb::open(&layout.history_db_path).unwrap();
    let runs = db.list_runs(None).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].total, 0);
    assert!(layout.ledger_path.is_file());
}

#[test]
fn unreachable_destination_fails_the_record_not_the_run() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);
    write_fast_fail_config(root);
    let layout = MigrationLayout::new(root);
    fs::write(&layout.icon_catalog_path, "id,title,filename,url,alt_text\n").unwrap();
    fs::write(
        layout.page_path("412"),
        r#"{"id": 412, "title": {"rendered": "About"}, "slug": "about",
            "content": {"rendered": "<p>hi</p>"}, "acf": {}}"#,
    )
    .unwrap();
    fs::write(layout.page_path("413"), "{broken").unwrap();

    let mut cmd = pagelift(root);
    offline_destination(&mut cmd)
        .args(["migrate", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed: 2"))
        .stdout(predicate::str::contains("Failed records:"))
        .stdout(predicate::str::contains("Failed after 1 attempts"));

    let db = RunHistoryDb::open(&layout.history_db_path).unwrap();
    let run = &db.list_runs(None).unwrap()[0];
    assert!(!run.test_mode);
    let outcomes = db.list_outcomes(run.id.unwrap()).unwrap();
    let stages: Vec<&str> = outcomes.iter().map(|o| o.stage.as_str()).collect();
    assert_eq!(stages, vec!["created", "loaded"]);

    pagelift(root)
        .args(["history", "--run", &run.id.unwrap().to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("stage=created FAILED"));
}
