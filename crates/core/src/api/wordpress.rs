use serde_json::Value;

use crate::api::{ApiCredentials, ContentApi, MediaItem, MediaUpload, RemoteRecord};
use crate::http::{basic_auth_header, ApiRequest, HttpError, Method, RetryingClient, Transport};

const PAGES_ROUTE: &str = "/wp-json/wp/v2/pages";
const MEDIA_ROUTE: &str = "/wp-json/wp/v2/media";

/// `ContentApi` over the WordPress REST dialect, authenticated with HTTP Basic.
///
/// Every call goes through the retrying client, so a returned error has
/// already exhausted its retry budget.
pub struct WordPressApi<T: Transport> {
    client: RetryingClient<T>,
    base_url: String,
    auth_header: String,
}

impl<T: Transport> WordPressApi<T> {
    pub fn new(credentials: &ApiCredentials, client: RetryingClient<T>) -> Self {
        Self {
            client,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            auth_header: basic_auth_header(&credentials.username, &credentials.password),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &RetryingClient<T> {
        &self.client
    }

    fn request(&self, method: Method, route: &str) -> ApiRequest {
        ApiRequest::new(method, format!("{}{}", self.base_url, route))
            .header("Authorization", self.auth_header.as_str())
    }
}

impl<T: Transport> ContentApi for WordPressApi<T> {
    fn list_by_slug(&self, slug: &str) -> Result<Vec<Value>, HttpError> {
        let request = self.request(Method::Get, PAGES_ROUTE).query("slug", slug);
        match self.client.send(&request)? {
            Value::Array(items) => Ok(items),
            other => Err(HttpError::Decode(format!("expected a list of pages, got {other}"))),
        }
    }

    fn create_record(&self, payload: &Value) -> Result<RemoteRecord, HttpError> {
        let request = self.request(Method::Post, PAGES_ROUTE).json(payload.clone());
        parse_remote_record(&self.client.send(&request)?)
    }

    fn update_record(&self, id: &str, payload: &Value) -> Result<RemoteRecord, HttpError> {
        let route = format!("{PAGES_ROUTE}/{id}");
        let request = self.request(Method::Patch, &route).json(payload.clone());
        parse_remote_record(&self.client.send(&request)?)
    }

    fn create_media(&self, upload: &MediaUpload) -> Result<String, HttpError> {
        let request = self
            .request(Method::Post, MEDIA_ROUTE)
            .query("title", upload.title.as_str())
            .query("alt_text", upload.alt_text.as_str())
            .binary(upload.bytes.clone(), upload.content_type.as_str(), upload.filename.as_str());
        let response = self.client.send(&request)?;
        id_string(response.get("id"))
            .ok_or_else(|| HttpError::Decode("media response has no id".to_string()))
    }

    fn list_media(&self, page: u32, page_size: u32) -> Result<Vec<MediaItem>, HttpError> {
        let request = self
            .request(Method::Get, MEDIA_ROUTE)
            .query("per_page", page_size.to_string())
            .query("page", page.to_string());
        match self.client.send(&request)? {
            Value::Array(items) => Ok(items.iter().filter_map(parse_media_item).collect()),
            other => Err(HttpError::Decode(format!("expected a list of media, got {other}"))),
        }
    }
}

/// Parse `{id, link}` from a create/update response.
pub fn parse_remote_record(value: &Value) -> Result<RemoteRecord, HttpError> {
    let id = id_string(value.get("id"))
        .ok_or_else(|| HttpError::Decode("record response has no id".to_string()))?;
    let url = value.get("link").and_then(Value::as_str).unwrap_or_default().to_string();
    Ok(RemoteRecord { id, url })
}

/// Parse one media listing entry; entries without a numeric id are skipped.
pub fn parse_media_item(value: &Value) -> Option<MediaItem> {
    let id = value.get("id").and_then(Value::as_u64)?;
    let title = match value.get("title") {
        Some(Value::Object(obj)) => obj.get("rendered").and_then(Value::as_str),
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
    .unwrap_or_default()
    .to_string();
    let text = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    Some(MediaItem {
        id,
        title,
        mime_type: text("mime_type"),
        source_url: text("source_url"),
        alt_text: text("alt_text"),
    })
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
