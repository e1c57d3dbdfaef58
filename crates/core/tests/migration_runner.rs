use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use pagelift_core::api::{ContentApi, MediaItem, MediaUpload, RemoteRecord};
use pagelift_core::db::{MigrationSettings, RecordMode};
use pagelift_core::error::RecordStage;
use pagelift_core::http::HttpError;
use pagelift_core::icons::{IconLibrary, IconMatcher};
use pagelift_core::ledger::{Ledger, LedgerRecord};
use pagelift_core::services::{ImagePool, MigrationRunner, StagedDocument};
use serde_json::{json, Value};

#[derive(Default)]
struct DestinationState {
    next_id: u64,
    creates: Vec<Value>,
    updates: Vec<(String, Value)>,
    uploads: Vec<MediaUpload>,
    failing_titles: HashSet<String>,
    failing_media: bool,
}

/// In-memory destination site.
#[derive(Default)]
struct FakeDestination {
    state: Mutex<DestinationState>,
}

impl FakeDestination {
    fn failing_for(title: &str) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().failing_titles.insert(title.to_string());
        fake
    }

    fn creates(&self) -> Vec<Value> {
        self.state.lock().unwrap().creates.clone()
    }

    fn updates(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().updates.clone()
    }

    fn uploads(&self) -> Vec<MediaUpload> {
        self.state.lock().unwrap().uploads.clone()
    }
}

fn exhausted() -> HttpError {
    HttpError::Exhausted {
        attempts: 3,
        last: Box::new(HttpError::Status { status: 500, body: "boom".to_string() }),
    }
}

impl ContentApi for FakeDestination {
    fn list_by_slug(&self, _slug: &str) -> Result<Vec<Value>, HttpError> {
        Ok(Vec::new())
    }

    fn create_record(&self, payload: &Value) -> Result<RemoteRecord, HttpError> {
        let mut state = self.state.lock().unwrap();
        let title = payload["title"].as_str().unwrap_or_default().to_string();
        if state.failing_titles.contains(&title) {
            return Err(exhausted());
        }
        state.next_id += 1;
        let id = (900 + state.next_id).to_string();
        state.creates.push(payload.clone());
        let slug = payload["slug"].as_str().unwrap_or_default();
        Ok(RemoteRecord { url: format!("https://dest.test/{slug}/"), id })
    }

    fn update_record(&self, id: &str, payload: &Value) -> Result<RemoteRecord, HttpError> {
        let mut state = self.state.lock().unwrap();
        state.updates.push((id.to_string(), payload.clone()));
        Ok(RemoteRecord { id: id.to_string(), url: format!("https://dest.test/p/{id}/") })
    }

    fn create_media(&self, upload: &MediaUpload) -> Result<String, HttpError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_media {
            return Err(exhausted());
        }
        state.uploads.push(upload.clone());
        Ok((5000 + state.uploads.len()).to_string())
    }

    fn list_media(&self, _page: u32, _page_size: u32) -> Result<Vec<MediaItem>, HttpError> {
        Ok(Vec::new())
    }
}

const CATALOG: &str = "id,title,filename,url,alt_text
20813,Icon=shield-2,shield-2.svg,u,
20815,Icon=firewall,firewall.svg,u,
20816,Icon=cloud-1,cloud-1.svg,u,
20817,Icon=gear-man,gear-man.svg,u,
";

fn page(id: u64, title: &str, services: &[&str], image_fields: &[&str]) -> StagedDocument {
    let mut acf = serde_json::Map::new();
    acf.insert("hero_heading".to_string(), json!(title));
    acf.insert(
        "services_repeater".to_string(),
        Value::Array(
            services
                .iter()
                .map(|s| json!({ "service_title": s, "service_icon": null, "icon": 1 }))
                .collect(),
        ),
    );
    for field in image_fields {
        acf.insert(field.to_string(), json!(123));
    }
    let body = json!({
        "id": id,
        "title": { "rendered": title },
        "slug": title.to_lowercase().replace(' ', "-"),
        "status": "publish",
        "content": { "rendered": format!("<p>{title}</p>") },
        "acf": acf,
    });
    StagedDocument::new(format!("{id}.json"), body.to_string())
}

fn image_dir(root: &Path, count: usize) -> std::path::PathBuf {
    let dir = root.join("images");
    std::fs::create_dir_all(&dir).unwrap();
    for i in 0..count {
        std::fs::write(dir.join(format!("img-{i}.webp")), format!("image {i}")).unwrap();
    }
    dir
}

fn all_records() -> MigrationSettings {
    MigrationSettings { test_mode: false, ..MigrationSettings::default() }
}

fn runner<'a>(
    api: &'a FakeDestination,
    settings: MigrationSettings,
    root: &Path,
    images: usize,
) -> MigrationRunner<'a> {
    let pool = ImagePool::load(&image_dir(root, images), Some(7)).unwrap();
    let ledger = Ledger::load(root.join("created_pages.json")).unwrap();
    MigrationRunner::new(
        api,
        settings,
        IconLibrary::from_csv_str(CATALOG),
        IconMatcher::default(),
        pool,
        ledger,
    )
}

#[test]
fn rerun_updates_instead_of_creating_again() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let docs = vec![page(412, "About", &["Cybersecurity"], &["about_us_image"])];

    let first = runner(&api, all_records(), temp.path(), 3).run(&docs).unwrap();
    assert_eq!(first.outcomes[0].mode, Some(RecordMode::Create));
    assert!(first.outcomes[0].success);
    assert_eq!(api.creates().len(), 1);
    assert_eq!(api.uploads().len(), 1);

    let second = runner(&api, all_records(), temp.path(), 3).run(&docs).unwrap();
    let outcome = &second.outcomes[0];
    assert_eq!(outcome.mode, Some(RecordMode::Update));
    assert_eq!(outcome.stage, RecordStage::Done);
    assert_eq!(api.creates().len(), 1, "no second create");
    assert_eq!(api.uploads().len(), 1, "existing media is kept");

    let updates = api.updates();
    let (id, payload) = updates.last().unwrap();
    assert_eq!(id, "901");
    assert_eq!(payload["title"], "About");

    let ledger = Ledger::load(temp.path().join("created_pages.json")).unwrap();
    assert_eq!(ledger.len(), 1);
    let entry = ledger.get("412").unwrap();
    assert_eq!(entry.destination_id, "901");
    assert_eq!(
        entry.media_field_id_by_name.get("about_us_image").map(String::as_str),
        Some("5001")
    );
}

#[test]
fn one_failing_record_does_not_stop_the_others() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::failing_for("Beta");
    let docs =
        vec![page(1, "Alpha", &[], &[]), page(2, "Beta", &[], &[]), page(3, "Gamma", &[], &[])];

    let report = runner(&api, all_records(), temp.path(), 0).run(&docs).unwrap();
    let flags: Vec<bool> = report.outcomes.iter().map(|o| o.success).collect();
    assert_eq!(flags, vec![true, false, true]);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let failed = report.failures().next().unwrap();
    assert_eq!(failed.origin_id, "2");
    assert_eq!(failed.stage, RecordStage::Created);
    assert_eq!(failed.terminal(), RecordStage::Failed);
    assert!(failed.record.is_none());
    assert!(failed.error.as_deref().unwrap().contains("Failed after 3 attempts"));

    let ledger = Ledger::load(temp.path().join("created_pages.json")).unwrap();
    let origins: Vec<&str> = ledger.records().iter().map(|r| r.origin_id.as_str()).collect();
    assert_eq!(origins, vec!["1", "3"]);
}

#[test]
fn failed_image_step_still_records_the_destination() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    api.state.lock().unwrap().failing_media = true;
    let docs = vec![page(7, "Contact", &[], &["image_text_section_1_image"])];

    let report = runner(&api, all_records(), temp.path(), 2).run(&docs).unwrap();
    let outcome = &report.outcomes[0];
    assert!(!outcome.success);
    assert_eq!(outcome.stage, RecordStage::ImagesHandled);
    assert_eq!(outcome.record.as_ref().unwrap().destination_id, "901");

    api.state.lock().unwrap().failing_media = false;
    let retry = runner(&api, all_records(), temp.path(), 2).run(&docs).unwrap();
    assert_eq!(retry.outcomes[0].mode, Some(RecordMode::Update));
    assert!(retry.outcomes[0].success);
    assert_eq!(api.creates().len(), 1);
    assert_eq!(api.uploads().len(), 1, "no media recorded yet, so images upload");
}

#[test]
fn upload_new_images_forces_fresh_uploads() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let docs = vec![page(412, "About", &[], &["about_us_image"])];

    runner(&api, all_records(), temp.path(), 3).run(&docs).unwrap();
    let settings = MigrationSettings { upload_new_images: true, ..all_records() };
    runner(&api, settings, temp.path(), 3).run(&docs).unwrap();

    assert_eq!(api.uploads().len(), 2);
    let ledger = Ledger::load(temp.path().join("created_pages.json")).unwrap();
    assert_eq!(ledger.get("412").unwrap().media_field_id_by_name["about_us_image"], "5002");
}

#[test]
fn ledger_entry_without_media_gets_images() {
    let temp = tempfile::tempdir().unwrap();
    let mut seeded = Ledger::new(temp.path().join("created_pages.json"));
    seeded.upsert(LedgerRecord {
        origin_id: "412".to_string(),
        destination_id: "777".to_string(),
        title: "About".to_string(),
        url: "https://dest.test/about/".to_string(),
        media_field_id_by_name: BTreeMap::new(),
    });
    seeded.save().unwrap();

    let api = FakeDestination::default();
    let docs = vec![page(412, "About", &[], &["about_us_image", "image_text_section_3_image"])];
    let report = runner(&api, all_records(), temp.path(), 4).run(&docs).unwrap();

    assert!(report.outcomes[0].success);
    assert!(api.creates().is_empty());
    assert_eq!(api.uploads().len(), 2);
    let updates = api.updates();
    assert_eq!(updates.len(), 2);
    assert!(updates.iter().all(|(id, _)| id == "777"));
    assert_eq!(
        updates[1].1,
        json!({ "acf": { "about_us_image": 5002, "image_text_section_3_image": 5001 } })
    );
}

#[test]
fn images_within_a_record_are_distinct() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let fields = [
        "image_text_section_1_image",
        "image_text_section_2_image",
        "image_text_section_3_image",
        "image_text_section_4_image",
        "about_us_image",
    ];
    let docs = vec![page(1, "Home", &[], &fields)];

    runner(&api, all_records(), temp.path(), 5).run(&docs).unwrap();
    let names: HashSet<String> = api.uploads().into_iter().map(|u| u.filename).collect();
    assert_eq!(names.len(), 5);
    assert!(api.uploads().iter().all(|u| u.title == "Home" && u.alt_text == "Home"));
}

#[test]
fn short_image_pool_fills_what_it_can() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let fields = ["image_text_section_1_image", "image_text_section_2_image", "about_us_image"];
    let docs = vec![page(1, "Home", &[], &fields)];

    let report = runner(&api, all_records(), temp.path(), 2).run(&docs).unwrap();
    assert!(report.outcomes[0].success);
    assert_eq!(api.uploads().len(), 2);
    assert_eq!(report.outcomes[0].record.as_ref().unwrap().media_field_id_by_name.len(), 2);
}

#[test]
fn test_mode_processes_only_the_first_document() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let docs = vec![page(1, "Alpha", &[], &[]), page(2, "Beta", &[], &[])];

    let report = runner(&api, MigrationSettings::default(), temp.path(), 0).run(&docs).unwrap();
    assert_eq!(report.staged_total, 2);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].origin_id, "1");
    assert_eq!(api.creates().len(), 1);
}

#[test]
fn malformed_documents_fail_at_load_without_touching_the_api() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let docs = vec![
        StagedDocument::new("broken.json", "{not json"),
        StagedDocument::new("untitled.json", r#"{"id": 5, "slug": "x", "content": "c"}"#),
        page(3, "Gamma", &[], &[]),
    ];

    let report = runner(&api, all_records(), temp.path(), 0).run(&docs).unwrap();
    for outcome in &report.outcomes[..2] {
        assert!(!outcome.success);
        assert_eq!(outcome.stage, RecordStage::Loaded);
        assert_eq!(outcome.mode, None);
        assert!(outcome.record.is_none());
    }
    assert_eq!(report.outcomes[0].label(), "broken.json");
    assert!(report.outcomes[1].error.as_deref().unwrap().contains("missing title"));
    assert!(report.outcomes[2].success);
    assert_eq!(api.creates().len(), 1);
}

#[test]
fn icons_are_never_reused_across_records() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let docs = vec![
        page(1, "Alpha", &["Cybersecurity", "Cloud Solutions"], &[]),
        page(2, "Beta", &["Cybersecurity", "Cybersecurity Solutions", "Managed IT"], &[]),
    ];

    let mut runner = runner(&api, all_records(), temp.path(), 0);
    runner.run(&docs).unwrap();
    assert_eq!(runner.used_icons().len(), 4);

    let mut seen = HashSet::new();
    let mut nulls = 0;
    for payload in api.creates() {
        for entry in payload["acf"]["services_repeater"].as_array().unwrap() {
            assert!(entry.get("icon").is_none());
            match entry["service_icon"].as_u64() {
                Some(id) => assert!(seen.insert(id), "icon {id} assigned twice"),
                None => nulls += 1,
            }
        }
    }
    assert_eq!(seen.len(), 4);
    assert_eq!(nulls, 1);
}

#[test]
fn ledger_is_on_disk_after_the_run() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::default();
    let docs = vec![page(1, "Alpha", &[], &[])];

    let mut runner = runner(&api, all_records(), temp.path(), 0);
    runner.run(&docs).unwrap();
    assert_eq!(runner.ledger().len(), 1);

    let raw = std::fs::read_to_string(temp.path().join("created_pages.json")).unwrap();
    let entries: Vec<Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(entries[0]["originId"], "1");
    assert_eq!(entries[0]["destinationId"], "901");
    assert_eq!(entries[0]["url"], "https://dest.test/alpha/");
}

#[test]
fn report_converts_to_history_rows() {
    let temp = tempfile::tempdir().unwrap();
    let api = FakeDestination::failing_for("Beta");
    let docs = vec![page(1, "Alpha", &[], &[]), page(2, "Beta", &[], &[])];

    let report = runner(&api, all_records(), temp.path(), 0).run(&docs).unwrap();
    let (run, outcomes) = report.to_history();
    assert_eq!(run.id, None);
    assert!(!run.test_mode);
    assert_eq!((run.total, run.succeeded, run.failed), (2, 1, 1));
    assert_eq!(outcomes[0].destination_id.as_deref(), Some("901"));
    assert_eq!(outcomes[1].destination_id, None);
    assert_eq!(outcomes[1].stage, RecordStage::Created);
    assert_eq!(outcomes[1].mode, Some(RecordMode::Create));
}

#[test]
fn seeded_pools_pick_the_same_images() {
    let temp = tempfile::tempdir().unwrap();
    let dir = image_dir(temp.path(), 6);
    let mut a = ImagePool::load(&dir, Some(42)).unwrap();
    let mut b = ImagePool::load(&dir, Some(42)).unwrap();
    assert_eq!(a.select(3), b.select(3));
    assert_eq!(a.select(10).len(), 6);
    assert!(ImagePool::load(&temp.path().join("missing"), None).unwrap().is_empty());
}
