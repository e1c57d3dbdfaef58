use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::ContentApi;
use crate::error::MigrationResult;

/// Read the URL list: one URL per line, blank lines ignored.
pub fn read_url_list(path: &Path) -> MigrationResult<Vec<String>> {
    let body = std::fs::read_to_string(path)?;
    Ok(body.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect())
}

/// Split a page URL into its origin (`scheme://host[:port]`) and slug (last
/// non-empty path segment). Query strings and fragments are ignored.
pub fn parse_source_url(url: &str) -> Option<(String, String)> {
    let (scheme, rest) = url.trim().split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host, path),
        None => (rest, ""),
    };
    if host.is_empty() {
        return None;
    }
    let slug = path.split('/').filter(|segment| !segment.is_empty()).next_back()?;
    Some((format!("{scheme}://{host}"), slug.to_string()))
}

/// One page saved to the staging directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedPage {
    pub url: String,
    pub slug: String,
    pub id: String,
    pub path: PathBuf,
}

/// One URL that produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub saved: Vec<FetchedPage>,
    pub failures: Vec<FetchFailure>,
}

/// Fetch each URL's page from its own origin and save the first match as
/// `pages_dir/{id}.json`.
///
/// `connect` builds the source API for an origin. Every URL is attempted;
/// failures are collected in the report rather than stopping the loop.
pub fn fetch_pages<F, A>(
    urls: &[String],
    pages_dir: &Path,
    mut connect: F,
) -> MigrationResult<FetchReport>
where
    F: FnMut(&str) -> A,
    A: ContentApi,
{
    std::fs::create_dir_all(pages_dir)?;
    let mut report = FetchReport::default();

    for url in urls {
        let mut fail = |reason: String| {
            warn!(url = %url, reason = %reason, "page not fetched");
            report.failures.push(FetchFailure { url: url.clone(), reason });
        };

        let Some((origin, slug)) = parse_source_url(url) else {
            fail("not a page URL".to_string());
            continue;
        };
        let api = connect(&origin);
        let pages = match api.list_by_slug(&slug) {
            Ok(pages) => pages,
            Err(err) => {
                fail(format!("Error fetching {slug}: {err}"));
                continue;
            }
        };
        let Some(page) = pages.into_iter().next() else {
            fail(format!("No page found for slug: {slug}"));
            continue;
        };
        let id = match page.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                fail(format!("Page for slug {slug} has no id"));
                continue;
            }
        };

        let path = pages_dir.join(format!("{id}.json"));
        let json = serde_json::to_string_pretty(&page)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        std::fs::write(&path, json)?;
        info!(slug = %slug, id = %id, path = %path.display(), "saved page");
        report.saved.push(FetchedPage { url: url.clone(), slug, id, path });
    }

    Ok(report)
}
