use std::collections::BTreeMap;

use pagelift_core::error::MigrationError;
use pagelift_core::model::{StagedRecord, IMAGE_FIELDS};
use pagelift_core::payload::{build_payload, media_payload, sanitize_fields, PayloadOptions};
use serde_json::{json, Value};

fn staged_page() -> Value {
    json!({
        "id": 412,
        "title": { "rendered": "Managed IT in Austin" },
        "slug": "managed-it-austin",
        "status": "publish",
        "content": { "rendered": "<p>Body</p>" },
        "acf": {
            "hero_heading": "Managed IT",
            "hero_subheading": "",
            "icon": 55,
            "interlinks": [{ "url": "/x" }],
            "image_text_section_1_image": 901,
            "image_text_section_2_image": false,
            "about_us_image": "",
            "services_repeater": [
                {
                    "service_title": "Cybersecurity",
                    "service_icon": 12,
                    "icon": 3,
                    "service_text": ""
                },
                { "service_title": "", "service_icon": 13 }
            ],
            "faq": { "items": [{ "question": "Why?", "answer": "", "interlinks": "a" }] }
        }
    })
}

#[test]
fn sanitizer_drops_keys_and_nulls_empty_strings() {
    let cleaned = sanitize_fields(&staged_page()["acf"], true);
    assert!(cleaned.get("icon").is_none());
    assert!(cleaned.get("interlinks").is_none());
    assert_eq!(cleaned["hero_subheading"], Value::Null);
    assert_eq!(cleaned["services_repeater"][0]["service_icon"], json!(12));
    assert!(cleaned["services_repeater"][0].get("icon").is_none());
    assert_eq!(cleaned["services_repeater"][0]["service_text"], Value::Null);
    assert!(cleaned["faq"]["items"][0].get("interlinks").is_none());
    assert_eq!(cleaned["faq"]["items"][0]["answer"], Value::Null);
}

#[test]
fn sanitizer_keeps_interlinks_when_not_clearing() {
    let cleaned = sanitize_fields(&staged_page()["acf"], false);
    assert_eq!(cleaned["interlinks"], json!([{ "url": "/x" }]));
    assert!(cleaned.get("icon").is_none());
}

#[test]
fn sanitizer_is_a_fixed_point() {
    for clear in [true, false] {
        let once = sanitize_fields(&staged_page()["acf"], clear);
        let twice = sanitize_fields(&once, clear);
        assert_eq!(once, twice);
    }
}

#[test]
fn sanitizer_leaves_top_level_scalars_alone() {
    assert_eq!(sanitize_fields(&json!(""), true), json!(""));
    assert_eq!(sanitize_fields(&json!([""]), true), json!([""]));
}

#[test]
fn payload_projects_fields_and_strips_images() {
    let record = StagedRecord::from_json("412.json", &staged_page()).unwrap();
    let payload = build_payload(&record, &PayloadOptions::default());

    assert_eq!(payload["title"], "Managed IT in Austin");
    assert_eq!(payload["slug"], "managed-it-austin");
    assert_eq!(payload["status"], "publish");
    assert_eq!(payload["content"], "<p>Body</p>");
    assert_eq!(payload["page-category"], json!([10]));
    assert_eq!(payload["acf"]["disable_automatic_interlinking"], json!(false));
    for field in IMAGE_FIELDS {
        assert!(payload["acf"].get(field).is_none(), "{field} should be stripped");
    }
    assert!(payload["acf"].get("interlinks").is_none());
}

#[test]
fn payload_uses_configured_category_and_interlink_flag() {
    let record = StagedRecord::from_json("412.json", &staged_page()).unwrap();
    let options = PayloadOptions { clear_interlinking_metadata: false, page_category: 7 };
    let payload = build_payload(&record, &options);
    assert_eq!(payload["page-category"], json!([7]));
    assert!(payload["acf"].get("interlinks").is_some());
}

#[test]
fn truthy_image_fields_are_tracked_in_fixed_order() {
    let record = StagedRecord::from_json("412.json", &staged_page()).unwrap();
    assert_eq!(record.image_fields_with_values(), vec!["image_text_section_1_image"]);
}

#[test]
fn staged_record_requires_title_content_and_slug() {
    for missing in ["title", "content", "slug", "id"] {
        let mut page = staged_page();
        page.as_object_mut().unwrap().remove(missing);
        let err = StagedRecord::from_json("bad.json", &page).unwrap_err();
        match err {
            MigrationError::MalformedInput { document, reason } => {
                assert_eq!(document, "bad.json");
                assert!(reason.contains(missing), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn staged_record_defaults_status_and_tolerates_missing_fields_block() {
    let mut page = staged_page();
    let obj = page.as_object_mut().unwrap();
    obj.remove("status");
    obj.insert("acf".to_string(), json!([]));
    let record = StagedRecord::from_json("412.json", &page).unwrap();
    assert_eq!(record.status, "draft");
    assert!(record.structured_fields.is_empty());
    assert!(record.services().is_empty());
}

#[test]
fn assigned_icons_are_written_back_except_for_blank_titles() {
    let mut record = StagedRecord::from_json("412.json", &staged_page()).unwrap();
    let mut services = record.services();
    services[0].assigned_icon_id = Some(20815);
    services[1].assigned_icon_id = None;
    record.apply_services(&services);

    let payload = build_payload(&record, &PayloadOptions::default());
    let entries = payload["acf"]["services_repeater"].as_array().unwrap();
    assert_eq!(entries[0]["service_icon"], json!(20815));
    assert_eq!(entries[1]["service_icon"], json!(13));
}

#[test]
fn media_payload_sends_numeric_ids_as_numbers() {
    let mut media = BTreeMap::new();
    media.insert("about_us_image".to_string(), "77".to_string());
    media.insert("image_text_section_1_image".to_string(), "abc".to_string());
    assert_eq!(
        media_payload(&media),
        json!({ "acf": { "about_us_image": 77, "image_text_section_1_image": "abc" } })
    );
}
