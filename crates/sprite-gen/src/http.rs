//! Blocking HTTP transport over `ureq`
//!
//! Every call carries its own timeout, independent of (and shorter than) the
//! overall task deadline enforced by the wait loop. Non-2xx responses are
//! returned as replies rather than errors so callers can keep the raw body.

use crate::signing::{Method, SignedRequest};
use sprite_core::{Result, SpriteError};
use std::time::Duration;

/// A response whose body has been read as text
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Thin wrapper around a configured `ureq::Agent`
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
        }
    }

    /// Send a request descriptor. Transport failures map to `NetworkError`.
    pub fn send(&self, request: &SignedRequest) -> Result<HttpReply> {
        log::debug!("{:?} {}", request.method, request.url);

        let response = match request.method {
            Method::Post => {
                let mut builder = self.agent.post(&request.url);
                for (k, v) in &request.query {
                    builder = builder.query(k, v);
                }
                for (k, v) in &request.headers {
                    builder = builder.header(k, v);
                }
                match &request.body {
                    Some(body) => builder.send_json(body),
                    None => builder.send_empty(),
                }
            }
            Method::Get => {
                let mut builder = self.agent.get(&request.url);
                for (k, v) in &request.query {
                    builder = builder.query(k, v);
                }
                for (k, v) in &request.headers {
                    builder = builder.header(k, v);
                }
                builder.call()
            }
        };

        let mut response =
            response.map_err(|e| SpriteError::NetworkError(format!("{}: {}", request.url, e)))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| SpriteError::NetworkError(format!("Failed to read response: {}", e)))?;

        Ok(HttpReply { status, body })
    }

    /// Open a GET for streaming a large body (artifact downloads).
    ///
    /// Returns the status code and a reader over the body.
    pub fn open(&self, url: &str) -> std::result::Result<(u16, impl std::io::Read), ureq::Error> {
        let response = self.agent.get(url).call()?;
        let status = response.status().as_u16();
        Ok((status, response.into_body().into_reader()))
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    config.into()
}
