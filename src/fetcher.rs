use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::http_client::{HttpResponse, Transport};
use crate::state::ResourceResult;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Player not found: {context}")]
    NotFound { context: String },
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("API error ({status}): {context}")]
    Api { status: u16, context: String },
    #[error("Network error. Please check your internet connection.")]
    Network,
    #[error("Invalid response for {context}: {source}")]
    Malformed {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
        }
    }

    /// Linear backoff: the n-th retry (1-based) waits `n * base_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// Issues single logical GETs, classifying HTTP failures and retrying only
/// connection-level ones.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sleeper: Arc::new(ThreadSleeper),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn fetch(&self, url: &str, context: &str) -> ResourceResult {
        match self.fetch_json(url, context) {
            Ok(data) => ResourceResult::fresh(data),
            Err(err) => ResourceResult::failed(err.to_string()),
        }
    }

    pub fn fetch_json(&self, url: &str, context: &str) -> Result<Value, FetchError> {
        let mut retry = 0u32;
        loop {
            match self.transport.get(url) {
                Ok(resp) => return decode_response(resp, context),
                Err(err) => {
                    if retry >= self.policy.max_retries {
                        warn!(url, context, error = %err, "giving up after {retry} retries");
                        return Err(FetchError::Network);
                    }
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    debug!(url, error = %err, ?delay, "network failure, retry {retry}");
                    self.sleeper.sleep(delay);
                }
            }
        }
    }
}

fn decode_response(resp: HttpResponse, context: &str) -> Result<Value, FetchError> {
    match resp.status {
        404 => {
            return Err(FetchError::NotFound {
                context: context.to_string(),
            });
        }
        429 => return Err(FetchError::RateLimited),
        _ if !resp.is_success() => {
            return Err(FetchError::Api {
                status: resp.status,
                context: context.to_string(),
            });
        }
        _ => {}
    }
    serde_json::from_str(&resp.body).map_err(|source| FetchError::Malformed {
        context: context.to_string(),
        source,
    })
}
