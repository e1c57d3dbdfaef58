use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::model::IconResource;

/// Catalog titles carrying this prefix are icon resources.
pub const ICON_TITLE_PREFIX: &str = "Icon=";

/// Columns of the icon catalog file.
pub const CATALOG_HEADER: [&str; 5] = ["id", "title", "filename", "url", "alt_text"];

/// Immutable catalog of icons available for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconLibrary {
    icons: Vec<IconResource>,
}

impl IconLibrary {
    pub fn new(icons: Vec<IconResource>) -> Self {
        Self { icons }
    }

    /// Parse catalog CSV text. The first line is a header; rows whose title
    /// lacks the icon prefix or whose id is not an integer are skipped.
    pub fn from_csv_str(csv: &str) -> Self {
        let mut icons = Vec::new();
        for (line_no, line) in csv.lines().enumerate().skip(1) {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split(',').collect();
            let title = columns.get(1).map(|s| s.trim()).unwrap_or_default();
            let Some(name) = title.strip_prefix(ICON_TITLE_PREFIX) else {
                continue;
            };
            let Ok(id) = columns[0].trim().parse::<u64>() else {
                warn!(line = line_no + 1, "skipping icon catalog row with invalid id");
                continue;
            };
            icons.push(IconResource {
                id,
                canonical_name: name.trim().to_string(),
                source_file: columns.get(2).map(|s| s.trim()).unwrap_or_default().to_string(),
                source_url: columns.get(3).map(|s| s.trim()).unwrap_or_default().to_string(),
            });
        }
        Self { icons }
    }

    /// Load the catalog at `path`.
    ///
    /// A missing or unreadable catalog yields an empty library; every icon
    /// assignment then degrades to `None` and the migration carries on.
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "icon catalog not found; icons will not be assigned");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(csv) => {
                let library = Self::from_csv_str(&csv);
                info!(count = library.len(), path = %path.display(), "loaded icon catalog");
                library
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read icon catalog");
                Self::default()
            }
        }
    }

    pub fn icons(&self) -> &[IconResource] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

/// Icon ids already handed out in the current run.
///
/// One set lives for a whole migration pass, not per record, which is what
/// keeps icons unique across every service of every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedIconSet {
    ids: HashSet<u64>,
}

impl UsedIconSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Returns false if the id was already used.
    pub fn insert(&mut self, id: u64) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
