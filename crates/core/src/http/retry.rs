use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http::{ApiRequest, HttpError, Transport};

/// Bounded retry with pure exponential backoff (no jitter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: default_max_attempts(), initial_delay_ms: default_initial_delay_ms() }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay_ms: u64) -> Self {
        Self { max_attempts, initial_delay_ms }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based):
    /// `initial_delay * 2^(attempt-1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(20);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(1_u64 << exp))
    }
}

/// Blocking wait between attempts. Tests substitute a recording sleeper.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Wraps a transport with the retry policy and JSON decoding.
pub struct RetryingClient<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl<T: Transport> RetryingClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy, sleeper: Box::new(ThreadSleeper) }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request`, retrying transient failures until the attempt budget
    /// is spent.
    ///
    /// A success response returns immediately with its body parsed as JSON.
    /// A success response whose body does not parse is returned as
    /// `HttpError::Decode` without re-sending the request. Otherwise the
    /// terminal error is `HttpError::Exhausted`, reporting the attempt count
    /// and the last failure.
    pub fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, HttpError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = HttpError::Transport("no attempt made".to_string());

        for attempt in 1..=max_attempts {
            match self.attempt(request) {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(url = %request.url, attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_transient() => {
                    warn!(
                        method = request.method.as_str(),
                        url = %request.url,
                        attempt,
                        error = %err,
                        "request succeeded but the response was unusable"
                    );
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        method = request.method.as_str(),
                        url = %request.url,
                        attempt,
                        max_attempts,
                        error = %err,
                        "request attempt failed"
                    );
                    last_error = err;
                    if attempt < max_attempts {
                        let delay = self.policy.delay_after(attempt);
                        debug!(delay_ms = delay.as_millis() as u64, "retrying after backoff");
                        self.sleeper.sleep(delay);
                    }
                }
            }
        }

        Err(HttpError::Exhausted { attempts: max_attempts, last: Box::new(last_error) })
    }

    fn attempt(&self, request: &ApiRequest) -> Result<serde_json::Value, HttpError> {
        let response = self.transport.execute(request)?;
        if !response.is_success() {
            return Err(HttpError::Status { status: response.status, body: response.body });
        }
        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|err| HttpError::Decode(err.to_string()))
    }
}
