//! HTTP transport seam
//!
//! Every remote call in the crate goes through the [`Transport`] trait so that
//! adapters can be exercised against canned responses. [`HttpTransport`] is the
//! `reqwest`-backed implementation used by the binary.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::TransportErrorCode;
use crate::{Result, WanderlistError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outgoing request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Query string pairs, percent-encoded by the transport
    pub query: Vec<(String, String)>,
    /// JSON body for POST requests
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn post(url: impl Into<String>, body: Value, timeout: Duration) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
            headers: Vec::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    /// Value of a query parameter, if present
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Full URL with the query string appended
    #[must_use]
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query)
    }
}

/// Status code and decoded JSON body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Fails only on network, timeout or decoding problems;
    /// non-success statuses are returned as responses.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest` implementation of [`Transport`]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("wanderlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                WanderlistError::transport(
                    TransportErrorCode::Network,
                    format!("Failed to create HTTP client: {e}"),
                )
            })?;
        Ok(Self { client })
    }
}

fn classify(err: &reqwest::Error) -> TransportErrorCode {
    if err.is_timeout() {
        TransportErrorCode::Timeout
    } else if err.is_decode() {
        TransportErrorCode::Decode
    } else {
        TransportErrorCode::Network
    }
}

/// Wrap a `reqwest` failure without its URL, whose query string carries API keys
fn transport_error(err: reqwest::Error) -> WanderlistError {
    let err = err.without_url();
    WanderlistError::transport(classify(&err), err.to_string())
}

#[async_trait]
impl Transport for HttpTransport {
    // The query string carries API keys, so only the path is recorded
    #[instrument(skip(self, request), fields(url = %request.url, method = ?request.method))]
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let start = Instant::now();
        let url = request.full_url();

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder.timeout(request.timeout);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let err = transport_error(e);
            warn!("Request failed after {:.3}s: {}", start.elapsed().as_secs_f64(), err);
            err
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(transport_error)?;

        debug!(
            "HTTP {} received in {:.3}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                WanderlistError::transport(
                    TransportErrorCode::Decode,
                    format!("Invalid JSON body (HTTP {status}): {e}"),
                )
            })?
        };

        Ok(HttpResponse { status, body })
    }
}
