use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::icons::matcher::normalize_label;

/// Curated service-title → icon-name pairs, keyed by normalized title.
const EXACT_MATCHES: &[(&str, &str)] = &[
    ("managed it services", "shield-2"),
    ("it consulting", "analytics-2"),
    ("it helpdesk", "helpdesk"),
    ("network support", "Network"),
    ("network management", "Network"),
    ("cloud services", "Cloud App"),
    ("cloud solutions", "cloud-1"),
    ("cloud integration", "cloud-connect"),
    ("cybersecurity", "firewall"),
    ("cybersecurity solutions", "shield-2"),
    ("cybersecurity protection", "shield-3"),
    ("it support", "headphones"),
    ("24/7 it support", "helpdesk"),
    ("24/7 live support", "helpdesk-head"),
    ("data backup and recovery", "backup-files"),
    ("data backup & recovery", "backup-files"),
    ("it compliance and audits", "certificate"),
    ("compliance solutions", "certificate-2"),
    ("voip services", "phone-1"),
    ("voip solutions", "phone-2"),
    ("strategic it consulting", "business-2"),
    ("device management", "Monitoring"),
    ("business continuity", "business-3"),
    ("help desk", "headphones"),
    ("cloud computing", "Cloud Internet"),
    ("security", "shield-2"),
    ("backup", "backup-files"),
    ("disaster recovery", "business-3"),
];

/// Single-word keyword → icon-name pairs used for scoring.
const KEYWORD_MATCHES: &[(&str, &str)] = &[
    ("cloud", "cloud-1"),
    ("security", "shield-2"),
    ("cyber", "firewall"),
    ("network", "Network"),
    ("backup", "backup-files"),
    ("recovery", "backup-files"),
    ("voip", "phone-1"),
    ("phone", "phone-2"),
    ("call", "phone-1"),
    ("helpdesk", "helpdesk"),
    ("support", "headphones"),
    ("help", "helpdesk-head"),
    ("consult", "analytics-2"),
    ("monitor", "Monitoring"),
    ("compliance", "certificate"),
    ("audit", "certificate-2"),
    ("manage", "gear-man"),
    ("device", "monitor-1"),
    ("data", "Folder Data"),
    ("analytics", "analytics-2"),
    ("business", "business-2"),
    ("continuity", "business-3"),
];

/// Generic icons tried, in order, when nothing scores.
const FALLBACK_ICONS: &[&str] = &["gear-man", "business-2", "apps"];

/// The three lookup tables driving icon selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconVocabulary {
    /// Normalized label → canonical icon name.
    pub exact: HashMap<String, String>,
    /// Lowercase token → canonical icon name.
    pub keywords: HashMap<String, String>,
    pub fallback: Vec<String>,
}

/// On-disk override; any table left out keeps its built-in contents.
#[derive(Debug, Default, Deserialize)]
struct VocabularyOverride {
    #[serde(default)]
    exact: Option<HashMap<String, String>>,
    #[serde(default)]
    keywords: Option<HashMap<String, String>>,
    #[serde(default)]
    fallback: Option<Vec<String>>,
}

impl Default for IconVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl IconVocabulary {
    pub fn builtin() -> Self {
        Self {
            exact: EXACT_MATCHES.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            keywords: KEYWORD_MATCHES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback: FALLBACK_ICONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Apply a YAML override on top of the built-in tables.
    ///
    /// Exact-match keys are normalized the same way labels are, so authors
    /// can write them with any casing or spacing.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let overlay: VocabularyOverride =
            serde_yaml::from_str(yaml).context("Failed to parse icon vocabulary YAML")?;
        let mut vocabulary = Self::builtin();
        if let Some(exact) = overlay.exact {
            vocabulary.exact = exact.into_iter().map(|(k, v)| (normalize_label(&k), v)).collect();
        }
        if let Some(keywords) = overlay.keywords {
            vocabulary.keywords =
                keywords.into_iter().map(|(k, v)| (k.trim().to_lowercase(), v)).collect();
        }
        if let Some(fallback) = overlay.fallback {
            vocabulary.fallback = fallback;
        }
        Ok(vocabulary)
    }

    /// Load the override at `path`, or the built-in tables when it is absent.
    pub fn load_or_builtin(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::builtin());
        }
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read icon vocabulary at {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }
}
