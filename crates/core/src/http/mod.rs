//! Outbound HTTP plumbing: request/response values, the transport seam, and
//! the retrying client used for every call to a remote content API.

pub mod retry;
pub mod transport;

pub use retry::{RetryPolicy, RetryingClient, Sleeper, ThreadSleeper};
pub use transport::UreqTransport;

use thiserror::Error;

/// HTTP methods used against the content API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

/// Request body variants.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Binary { bytes: Vec<u8>, content_type: String, filename: String },
}

/// A single outbound request. Cloneable so it can be replayed on retry.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    /// Query parameters; the transport percent-encodes them.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Header lookup by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn binary(
        mut self,
        bytes: Vec<u8>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        self.body = RequestBody::Binary {
            bytes,
            content_type: content_type.into(),
            filename: filename.into(),
        };
        self
    }
}

/// Raw response: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// Connection, DNS, TLS, or body read failure.
    #[error("{0}")]
    Transport(String),

    /// Non-success status code.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// All retry attempts failed; carries the last failure.
    #[error("Failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<HttpError> },
}

impl HttpError {
    /// True for failures the retry loop should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, HttpError::Transport(_) | HttpError::Status { .. })
    }
}

/// Executes a single request with no retry or interpretation of the status.
///
/// Implementations map I/O failures to `HttpError::Transport`; status codes
/// are returned as data.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError>;
}

/// Build an HTTP Basic `Authorization` header value.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    use base64::Engine;
    let token =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}
