use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::icons::{IconVocabulary, UsedIconSet};
use crate::model::{IconResource, ServiceEntry};

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is a valid regex"));

static BUILTIN: LazyLock<IconMatcher> = LazyLock::new(IconMatcher::default);

/// Normalize a service label: strip markup tags, decode the two entities the
/// source editor emits for plain text, lowercase, collapse whitespace.
pub fn normalize_label(label: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(label, "");
    let decoded = stripped.replace("&nbsp;", " ").replace("&amp;", "&");
    decoded.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Select an icon for `label` using the built-in vocabulary.
pub fn select_icon<'a>(
    label: &str,
    library: &'a [IconResource],
    used: &UsedIconSet,
) -> Option<&'a IconResource> {
    BUILTIN.select(label, library, used)
}

/// Picks icons for free-text service labels, never handing out an icon that
/// is already in the run's used set.
#[derive(Debug, Clone, Default)]
pub struct IconMatcher {
    vocabulary: IconVocabulary,
}

impl IconMatcher {
    pub fn new(vocabulary: IconVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &IconVocabulary {
        &self.vocabulary
    }

    /// Best available icon for `label`, or `None`.
    ///
    /// Order: curated exact match, keyword scoring, generic fallbacks, then
    /// any unused icon. Reads `used` but never modifies it; the caller
    /// records the pick.
    pub fn select<'a>(
        &self,
        label: &str,
        library: &'a [IconResource],
        used: &UsedIconSet,
    ) -> Option<&'a IconResource> {
        let normalized = normalize_label(label);
        if normalized.is_empty() {
            return None;
        }

        if let Some(icon) = self
            .vocabulary
            .exact
            .get(&normalized)
            .and_then(|name| find_available(name, library, used))
        {
            return Some(icon);
        }

        let available: Vec<&IconResource> =
            library.iter().filter(|icon| !used.contains(icon.id)).collect();
        if available.is_empty() {
            return None;
        }

        // Ties keep the first candidate in library order.
        let mut best: Option<(&IconResource, u32)> = None;
        for icon in &available {
            let score = self.keyword_score(&normalized, &icon.canonical_name);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((*icon, score));
            }
        }
        if let Some((icon, _)) = best {
            return Some(icon);
        }

        for name in &self.vocabulary.fallback {
            if let Some(icon) = find_available(name, library, used) {
                return Some(icon);
            }
        }

        available.first().copied()
    }

    /// +2 per label token whose keyword maps to `icon_name`, +1 when the icon
    /// name itself appears in the label.
    fn keyword_score(&self, normalized: &str, icon_name: &str) -> u32 {
        let mut score = 0;
        for token in normalized.split(' ') {
            if self
                .vocabulary
                .keywords
                .get(token)
                .is_some_and(|mapped| mapped.eq_ignore_ascii_case(icon_name))
            {
                score += 2;
            }
        }
        if normalized.contains(&icon_name.to_lowercase()) {
            score += 1;
        }
        score
    }

    /// Assign icons to one record's services, in order.
    ///
    /// Each pick goes into `used` before the next entry is considered, and
    /// `used` is shared by the whole run, so no icon is handed out twice.
    /// Entries with an empty title are skipped; entries with no available
    /// icon get `None`. Returns the number of entries that received an icon.
    pub fn assign_icons_to_services(
        &self,
        services: &mut [ServiceEntry],
        library: &[IconResource],
        used: &mut UsedIconSet,
    ) -> usize {
        let mut assigned = 0;
        for service in services.iter_mut() {
            if service.title.trim().is_empty() {
                continue;
            }
            match self.select(&service.title, library, used) {
                Some(icon) => {
                    used.insert(icon.id);
                    service.assigned_icon_id = Some(icon.id);
                    assigned += 1;
                    debug!(
                        label = %normalize_label(&service.title),
                        icon = %icon.canonical_name,
                        id = icon.id,
                        "assigned service icon"
                    );
                }
                None => {
                    service.assigned_icon_id = None;
                    warn!(label = %normalize_label(&service.title), "no unique icon available");
                }
            }
        }
        if !services.is_empty() {
            info!(assigned, total = services.len(), used = used.len(), "service icons assigned");
        }
        assigned
    }
}

fn find_available<'a>(
    name: &str,
    library: &'a [IconResource],
    used: &UsedIconSet,
) -> Option<&'a IconResource> {
    library
        .iter()
        .find(|icon| icon.canonical_name.eq_ignore_ascii_case(name) && !used.contains(icon.id))
}
