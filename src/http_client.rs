use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use thiserror::Error;

use crate::config::Config;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. The first caller's timeout wins for the process.
pub fn http_client(config: &Config) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The connection could not be established or the body could not be read.
/// Any response with a status line is an `HttpResponse`, never this.
#[derive(Debug, Clone, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: &'static Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            user_agent: config.user_agent.clone(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| TransportError(err.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|err| TransportError(format!("failed reading body: {err}")))?;
        Ok(HttpResponse { status, body })
    }
}
