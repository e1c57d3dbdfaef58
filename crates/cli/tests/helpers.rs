use std::fs;
use std::path::Path;

use pagelift::commands::MigrateOverrides;
use pagelift::{canonicalize_or_current, infer_project_name};
use pagelift_core::db::MigrationSettings;
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    std::env::set_current_dir(original).expect("restore cwd");
    assert_eq!(result, expected);
}

#[test]
fn canonicalize_or_current_resolves_existing_absolute_path() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let result =
        canonicalize_or_current(subdir.to_str().expect("utf-8 path")).expect("canonicalize");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn canonicalize_or_current_keeps_missing_absolute_path() {
    let tmp = tempdir().expect("tempdir");
    let missing = tmp.path().join("not-yet");
    let result = canonicalize_or_current(missing.to_str().expect("utf-8 path")).expect("resolve");
    assert_eq!(result, missing);
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("/srv/sites/acme-migration")), "acme-migration");
    assert_eq!(infer_project_name(Path::new("/tmp/project-root")), "project-root");
}

#[test]
fn infer_project_name_falls_back_when_missing() {
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn default_overrides_leave_settings_alone() {
    let mut settings = MigrationSettings::default();
    MigrateOverrides::default().apply(&mut settings);
    assert_eq!(settings, MigrationSettings::default());
}

#[test]
fn overrides_switch_off_test_mode_and_interlink_clearing() {
    let mut settings = MigrationSettings::default();
    let overrides = MigrateOverrides {
        all: true,
        upload_new_images: true,
        keep_interlinks: true,
        seed: Some(3),
    };
    overrides.apply(&mut settings);

    assert!(!settings.test_mode);
    assert!(settings.upload_new_images);
    assert!(!settings.clear_interlinking_metadata);
    assert_eq!(settings.image_seed, Some(3));
}

#[test]
fn overrides_never_turn_config_flags_back_on() {
    let mut settings =
        MigrationSettings { test_mode: false, image_seed: Some(1), ..MigrationSettings::default() };
    MigrateOverrides::default().apply(&mut settings);
    assert!(!settings.test_mode);
    assert_eq!(settings.image_seed, Some(1));
}
