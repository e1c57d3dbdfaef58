//! Icon assignment: the run's icon catalog, the curated vocabulary, and the
//! matcher that maps service labels to uniquely-used icons.

pub mod library;
pub mod matcher;
pub mod vocabulary;

pub use library::{IconLibrary, UsedIconSet, CATALOG_HEADER, ICON_TITLE_PREFIX};
pub use matcher::{normalize_label, select_icon, IconMatcher};
pub use vocabulary::IconVocabulary;
