//! Blocking control endpoint.
//!
//! The control surface (open, version read, close notice, file proxy,
//! database removal) is plain request/response, deliberately blocking to
//! preserve the legacy contract of synchronous return values. The actual
//! HTTP client is abstracted via a trait so tests can run against an
//! in-memory service.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use websql_protocol::decode_reply;

use crate::error::{ClientError, ClientResult};

/// Control-surface transport abstraction.
///
/// Implementations deliver one request and return the raw reply body
/// (an envelope, see [`call`]).
pub trait ControlEndpoint: Send + Sync {
    /// Sends a POST request with a JSON body and returns the reply body.
    fn post(&self, path: &str, body: &str) -> ClientResult<String>;

    /// Sends a GET request and returns the reply body.
    fn get(&self, path: &str) -> ClientResult<String>;
}

/// Sends one typed control call: encodes `request`, posts it, and decodes
/// the enveloped reply into `Reply`.
pub fn call<Req, Reply>(
    endpoint: &dyn ControlEndpoint,
    path: &str,
    request: &Req,
) -> ClientResult<Reply>
where
    Req: Serialize,
    Reply: DeserializeOwned,
{
    let body = serde_json::to_string(request)
        .map_err(|err| ClientError::Transport(format!("failed to encode request: {err}")))?;
    let reply = endpoint.post(path, &body)?;
    let payload = decode_reply(&reply)?;
    serde_json::from_value(payload)
        .map_err(|err| ClientError::Transport(format!("failed to decode reply: {err}")))
}

/// HTTP control endpoint backed by a blocking `reqwest` client.
pub struct HttpEndpoint {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpEndpoint {
    /// Creates an endpoint for the service at `base_url`
    /// (e.g. `http://127.0.0.1:9030`), with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn read_reply(&self, response: reqwest::blocking::Response) -> ClientResult<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "service answered with status {status}"
            )));
        }
        response
            .text()
            .map_err(|err| ClientError::Transport(err.to_string()))
    }
}

impl ControlEndpoint for HttpEndpoint {
    fn post(&self, path: &str, body: &str) -> ClientResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        self.read_reply(response)
    }

    fn get(&self, path: &str) -> ClientResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        self.read_reply(response)
    }
}
