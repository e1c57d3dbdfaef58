//! pagelift-core
//!
//! Core library for migrating content records between two content-management
//! API instances.
//!
//! This crate holds the icon matcher, payload builder, migration ledger,
//! retrying request client and the migration runner that ties them together,
//! plus project layout/config and the SQLite run history.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from the CLI or any other frontend.

pub mod api;
pub mod db;
pub mod error;
pub mod http;
pub mod icons;
pub mod ledger;
pub mod model;
pub mod payload;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
