use std::time::Duration;

use ureq::Agent;

use crate::http::{ApiRequest, ApiResponse, HttpError, Method, RequestBody, Transport};

/// Default global timeout for a single request.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Blocking transport backed by `ureq`.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        Self { agent: Agent::new_with_config(config) }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpError> {
        let result = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.query {
                    builder = builder.query(name.as_str(), value.as_str());
                }
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            Method::Post | Method::Patch => {
                let mut builder = if request.method == Method::Post {
                    self.agent.post(&request.url)
                } else {
                    self.agent.patch(&request.url)
                };
                for (name, value) in &request.query {
                    builder = builder.query(name.as_str(), value.as_str());
                }
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    RequestBody::Empty => builder.send_empty(),
                    RequestBody::Json(value) => {
                        let body = serde_json::to_vec(value)
                            .map_err(|err| HttpError::Decode(err.to_string()))?;
                        builder.header("Content-Type", "application/json").send(&body[..])
                    }
                    RequestBody::Binary { bytes, content_type, filename } => builder
                        .header("Content-Type", content_type.as_str())
                        .header(
                            "Content-Disposition",
                            format!("attachment; filename=\"{filename}\""),
                        )
                        .send(&bytes[..]),
                }
            }
        };

        let response = result.map_err(|err| {
            HttpError::Transport(format!("{} {}: {err}", request.method.as_str(), request.url))
        })?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|err| HttpError::Transport(format!("failed reading response body: {err}")))?;
        Ok(ApiResponse { status, body })
    }
}
