use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ContentApi, MediaItem};
use crate::error::MigrationResult;
use crate::icons::{CATALOG_HEADER, ICON_TITLE_PREFIX};

/// Media listing page size used while syncing.
pub const MEDIA_PAGE_SIZE: u32 = 100;
/// Icon sets whose titles start with this prefix are catalogued too.
pub const TYPER_TITLE_PREFIX: &str = "Typer=";
const SVG_MIME: &str = "image/svg+xml";

/// Outcome of a catalog sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSync {
    /// False when an existing catalog was kept.
    pub written: bool,
    /// SVG icon items found on the destination.
    pub fetched: usize,
    /// Rows written after the id floor and title de-duplication.
    pub rows: usize,
    pub pages: u32,
}

/// Page through the media library until an empty page, keeping SVG items
/// titled as icons. A page that fails stops the listing; what was collected
/// so far is kept.
pub fn fetch_svg_icons(api: &dyn ContentApi) -> (Vec<MediaItem>, u32) {
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        match api.list_media(page, MEDIA_PAGE_SIZE) {
            Ok(batch) if batch.is_empty() => break,
            Ok(batch) => {
                let total = batch.len();
                let before = items.len();
                items.extend(batch.into_iter().filter(is_svg_icon));
                info!(page, svg = items.len() - before, total, "fetched media page");
                page += 1;
            }
            Err(err) => {
                warn!(page, error = %err, "media listing failed; stopping");
                break;
            }
        }
    }
    (items, page - 1)
}

fn is_svg_icon(item: &MediaItem) -> bool {
    item.mime_type == SVG_MIME
        && (item.title.starts_with(ICON_TITLE_PREFIX) || item.title.starts_with(TYPER_TITLE_PREFIX))
}

/// Sort by id, drop ids below `min_id`, de-duplicate by title (first wins)
/// and render the catalog CSV.
pub fn render_catalog(items: &[MediaItem], min_id: Option<u64>) -> (String, usize) {
    let mut sorted: Vec<&MediaItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.id);

    let mut seen = HashSet::new();
    let mut lines = vec![CATALOG_HEADER.join(",")];
    for item in sorted {
        if min_id.is_some_and(|min| item.id < min) || !seen.insert(item.title.as_str()) {
            continue;
        }
        let filename = item.source_url.rsplit('/').next().unwrap_or_default();
        lines.push(format!(
            "{},{},{},{},{}",
            item.id, item.title, filename, item.source_url, item.alt_text
        ));
    }
    let rows = lines.len() - 1;
    (lines.join("\n"), rows)
}

/// Write the icon catalog at `path` from the destination's media library.
///
/// An existing catalog is kept unless `force` is set.
pub fn sync_icon_catalog(
    api: &dyn ContentApi,
    path: &Path,
    force: bool,
    min_id: Option<u64>,
) -> MigrationResult<CatalogSync> {
    if path.exists() && !force {
        info!(path = %path.display(), "icon catalog exists; skipping sync");
        return Ok(CatalogSync { written: false, fetched: 0, rows: 0, pages: 0 });
    }

    let (items, pages) = fetch_svg_icons(api);
    let (csv, rows) = render_catalog(&items, min_id);
    std::fs::write(path, csv)?;
    info!(path = %path.display(), fetched = items.len(), rows, "icon catalog written");
    Ok(CatalogSync { written: true, fetched: items.len(), rows, pages })
}
