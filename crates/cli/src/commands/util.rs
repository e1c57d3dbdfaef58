use std::path::Path;

use anyhow::{Context, Result};
use pagelift_core::api::{require_values, ApiCredentials, WordPressApi};
use pagelift_core::db::{load_project_config, MigrationLayout, ProjectConfig};
use pagelift_core::http::{RetryPolicy, RetryingClient, UreqTransport};

use crate::infer_project_name;

/// Destination endpoint and credentials.
pub const DESTINATION_URL_ENV: &str = "STAGING_URL";
pub const DESTINATION_USER_ENV: &str = "STAGING_USER";
pub const DESTINATION_PASS_ENV: &str = "STAGING_PASS";
/// Source credentials; the source endpoint comes from each fetched URL.
pub const SOURCE_USER_ENV: &str = "WP_USER";
pub const SOURCE_PASS_ENV: &str = "WP_PASS";

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Helper to print whether a file exists.
pub fn print_file_status(label: &str, path: &Path) {
    let exists = path.is_file();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Load `<root>/.env` if present. Variables already set in the process win.
pub fn load_project_env(layout: &MigrationLayout) {
    let project_env = layout.root.join(".env");
    if project_env.is_file() {
        let _ = dotenvy::from_path(&project_env);
    }
}

/// The project config, or defaults when the project was never initialized.
pub fn load_config_or_default(layout: &MigrationLayout) -> Result<ProjectConfig> {
    if layout.project_config_path.exists() {
        load_project_config(layout)
    } else {
        tracing::debug!(
            path = %layout.project_config_path.display(),
            "no project config; using defaults"
        );
        Ok(ProjectConfig::new(
            infer_project_name(&layout.root),
            layout.history_path_relative_string(),
        ))
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Destination credentials from the environment.
pub fn destination_credentials() -> Result<ApiCredentials> {
    let credentials = ApiCredentials::from_lookup(
        env_lookup,
        DESTINATION_URL_ENV,
        DESTINATION_USER_ENV,
        DESTINATION_PASS_ENV,
    )?;
    Ok(credentials)
}

/// Source username and password from the environment.
pub fn source_login() -> Result<(String, String)> {
    let mut values = require_values(env_lookup, &[SOURCE_USER_ENV, SOURCE_PASS_ENV])?.into_iter();
    let user = values.next().context("source user missing")?;
    let pass = values.next().context("source password missing")?;
    Ok((user, pass))
}

/// Blocking WordPress client with the project's retry policy.
pub fn connect(credentials: &ApiCredentials, retry: RetryPolicy) -> WordPressApi<UreqTransport> {
    WordPressApi::new(credentials, RetryingClient::new(UreqTransport::new(), retry))
}
