//! Blocking HTTP plumbing shared by the backend clients.
//!
//! Clients return every HTTP status as an [`HttpReply`]; only failures that
//! produce no usable reply (timeouts, connection errors) become [`ClientError`].

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use toolgate_core::config::Endpoint;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn has_empty_body(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend returned status {status}")]
    Status { status: u16, reason: Option<String>, body: Vec<u8> },
    #[error("response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        if error.is_decode() {
            return Self::Decode(error.to_string());
        }
        match error.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
                body: Vec::new(),
            },
            None => Self::Transport(error.to_string()),
        }
    }
}

/// Authenticated client bound to one backend base URL.
///
/// The underlying blocking client is built lazily on first use so that it is
/// created on a blocking worker thread rather than inside the async runtime.
pub struct ApiClient {
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
    http: OnceLock<Client>,
}

impl ApiClient {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self {
            base_url: endpoint.base_url,
            api_key: endpoint.api_key,
            timeout,
            http: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<HttpReply, ClientError> {
        let request = self.request(Method::GET, segments)?.query(query);
        self.send(request)
    }

    pub fn post<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<HttpReply, ClientError> {
        let request = self.request(Method::POST, segments)?.json(body);
        self.send(request)
    }

    pub fn patch<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<HttpReply, ClientError> {
        let request = self.request(Method::PATCH, segments)?.json(body);
        self.send(request)
    }

    pub fn delete(&self, segments: &[&str]) -> Result<HttpReply, ClientError> {
        let request = self.request(Method::DELETE, segments)?;
        self.send(request)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.url(segments)?;
        Ok(self
            .http()?
            .request(method, url)
            .bearer_auth(self.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|error| ClientError::Transport(format!("invalid base url: {error}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn http(&self) -> Result<&Client, ClientError> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("toolgate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        // a concurrent initializer may have won; either client is equivalent
        let _ = self.http.set(client);
        self.http
            .get()
            .ok_or_else(|| ClientError::Transport("http client failed to initialize".to_string()))
    }

    fn send(&self, request: RequestBuilder) -> Result<HttpReply, ClientError> {
        let response = request.send()?;
        let status = response.status().as_u16();
        let url = response.url().path().to_string();
        let body = response.bytes()?.to_vec();
        debug!(
            event_name = "backend.http.response",
            path = %url,
            status,
            body_len = body.len(),
            "backend request completed"
        );
        Ok(HttpReply { status, body })
    }
}

/// Page window shared by the list endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl Page {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = &self.cursor {
            query.push(("cursor", cursor.clone()));
        }
        query
    }
}
