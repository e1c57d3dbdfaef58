//! Run-level services built on the core components: the migration runner,
//! the page fetcher, and the icon catalog sync.

pub mod fetch;
pub mod icon_catalog;
pub mod migration;

pub use fetch::{
    fetch_pages, parse_source_url, read_url_list, FetchFailure, FetchReport, FetchedPage,
};
pub use icon_catalog::{fetch_svg_icons, render_catalog, sync_icon_catalog, CatalogSync};
pub use migration::{
    load_staged_documents, ImagePool, MigrationOutcome, MigrationRunner, RunReport, StagedDocument,
};
