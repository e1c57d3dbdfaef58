//! Remote content API seam.
//!
//! The migration engine only talks to the destination (and the fetcher to the
//! source) through `ContentApi`, so tests can substitute an in-memory fake.

pub mod wordpress;

pub use wordpress::WordPressApi;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MigrationError;
use crate::http::HttpError;

/// Identity of a record on the remote side after create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    pub url: String,
}

/// A media file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub title: String,
    pub alt_text: String,
}

impl MediaUpload {
    /// Read a file from disk into an upload, deriving the content type from
    /// the extension.
    pub fn from_path(
        path: &Path,
        title: impl Into<String>,
        alt_text: impl Into<String>,
    ) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self {
            bytes,
            content_type: content_type_for(&filename).to_string(),
            filename,
            title: title.into(),
            alt_text: alt_text.into(),
        })
    }
}

/// One entry of a media listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: u64,
    pub title: String,
    pub mime_type: String,
    pub source_url: String,
    pub alt_text: String,
}

/// Operations the migration needs from a content API.
pub trait ContentApi: Send + Sync {
    /// Records matching `slug` (read-only, source side).
    fn list_by_slug(&self, slug: &str) -> Result<Vec<Value>, HttpError>;
    fn create_record(&self, payload: &Value) -> Result<RemoteRecord, HttpError>;
    fn update_record(&self, id: &str, payload: &Value) -> Result<RemoteRecord, HttpError>;
    /// Upload a media file and return its new id.
    fn create_media(&self, upload: &MediaUpload) -> Result<String, HttpError>;
    /// One page (1-based) of the media library; an empty page ends the listing.
    fn list_media(&self, page: u32, page_size: u32) -> Result<Vec<MediaItem>, HttpError>;
}

impl<A: ContentApi + ?Sized> ContentApi for &A {
    fn list_by_slug(&self, slug: &str) -> Result<Vec<Value>, HttpError> {
        (**self).list_by_slug(slug)
    }

    fn create_record(&self, payload: &Value) -> Result<RemoteRecord, HttpError> {
        (**self).create_record(payload)
    }

    fn update_record(&self, id: &str, payload: &Value) -> Result<RemoteRecord, HttpError> {
        (**self).update_record(id, payload)
    }

    fn create_media(&self, upload: &MediaUpload) -> Result<String, HttpError> {
        (**self).create_media(upload)
    }

    fn list_media(&self, page: u32, page_size: u32) -> Result<Vec<MediaItem>, HttpError> {
        (**self).list_media(page, page_size)
    }
}

/// Endpoint plus HTTP Basic credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl ApiCredentials {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials through `lookup` (usually the process environment).
    ///
    /// Every missing or blank key is reported in one configuration error.
    pub fn from_lookup<F>(
        lookup: F,
        url_key: &str,
        user_key: &str,
        pass_key: &str,
    ) -> Result<Self, MigrationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = require_values(lookup, &[url_key, user_key, pass_key])?;
        match <[String; 3]>::try_from(values) {
            Ok([url, user, pass]) => Ok(Self::new(url, user, pass)),
            Err(_) => Err(MigrationError::Configuration("Incomplete credentials".to_string())),
        }
    }
}

/// Look up every key, failing with one configuration error that names all
/// missing or blank keys. Values come back in key order.
pub fn require_values<F>(lookup: F, keys: &[&str]) -> Result<Vec<String>, MigrationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();
    for key in keys {
        match lookup(key).filter(|value| !value.trim().is_empty()) {
            Some(value) => values.push(value),
            None => missing.push(*key),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(MigrationError::Configuration(format!(
            "Missing environment variables: {}",
            missing.join(", ")
        )))
    }
}

/// Content type for an uploaded file, by extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("webp") => "image/webp",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
