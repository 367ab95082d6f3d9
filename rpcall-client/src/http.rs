//! HTTP transports
//!
//! Each call is one `POST` of the request JSON to a fixed URL; the response
//! body is the raw response. `Content-Type: application/json` is always sent,
//! on top of any extra headers the caller configured.
//!
//! The HTTP status is not interpreted. JSON-RPC servers commonly answer
//! errors with 4xx/5xx codes and a JSON-RPC error body, so the body always
//! goes to the response interpreter; a non-JSON error page surfaces as
//! `Error::InvalidResponse`. Only failures to talk to the server at all
//! become `Error::Http`.

use crate::transport::{AsyncTransport, Transport};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use rpcall_core::{Error, RawResponse, Result};
use std::time::Duration;

/// Extra headers plus the fixed content type, as one map
fn request_headers(extra: &RwLock<HeaderMap>) -> HeaderMap {
    let mut headers = extra.read().clone();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::InvalidRequest(format!("invalid header name '{}': {}", name, e)))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidRequest(format!("invalid value for header '{}': {}", name, e)))?;
    Ok((header_name, header_value))
}

fn log_status(status: reqwest::StatusCode, id: u64) {
    if !status.is_success() {
        tracing::debug!(%status, id, "Non-success HTTP status, interpreting body anyway");
    }
}

macro_rules! header_accessors {
    () => {
        /// Endpoint URL
        pub fn url(&self) -> &str {
            &self.url
        }

        /// Extra headers sent with every request
        pub fn headers(&self) -> HeaderMap {
            self.headers.read().clone()
        }

        /// Replace the extra headers
        pub fn set_headers(&self, headers: HeaderMap) {
            *self.headers.write() = headers;
        }

        /// Add or replace one extra header
        pub fn insert_header(&self, name: &str, value: &str) -> Result<()> {
            let (name, value) = parse_header(name, value)?;
            self.headers.write().insert(name, value);
            Ok(())
        }
    };
}

/// Blocking HTTP transport on `reqwest::blocking`
///
/// Create and use it outside of an async runtime; from async code use
/// [`AsyncHttpTransport`].
///
/// ```rust,no_run
/// use rpcall_client::{HttpTransport, RpcClient};
///
/// let transport = HttpTransport::new("http://localhost:8545")?;
/// transport.insert_header("Authorization", "Bearer abc")?;
///
/// let client = RpcClient::new(transport);
/// let block = client.call("eth_blockNumber", None)?;
/// # Ok::<(), rpcall_core::Error>(())
/// ```
pub struct HttpTransport {
    url: String,
    headers: RwLock<HeaderMap>,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Transport for `url` with a default client
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self::with_client(url, client))
    }

    /// Transport for `url` with a per-request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self::with_client(url, client))
    }

    /// Transport for `url` reusing a configured client
    pub fn with_client(url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            url: url.into(),
            headers: RwLock::new(HeaderMap::new()),
            client,
        }
    }

    header_accessors!();
}

impl Transport for HttpTransport {
    fn send_and_receive(&self, request: &str, id: u64) -> Result<RawResponse> {
        let response = self
            .client
            .post(&self.url)
            .headers(request_headers(&self.headers))
            .body(request.to_owned())
            .send()
            .map_err(|e| Error::Http(e.to_string()))?;

        log_status(response.status(), id);

        let body = response.bytes().map_err(|e| Error::Http(e.to_string()))?;
        Ok(RawResponse::Bytes(body.to_vec()))
    }
}

/// Async HTTP transport on `reqwest`
pub struct AsyncHttpTransport {
    url: String,
    headers: RwLock<HeaderMap>,
    client: reqwest::Client,
}

impl AsyncHttpTransport {
    /// Transport for `url` with a default client
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self::with_client(url, client))
    }

    /// Transport for `url` with a per-request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self::with_client(url, client))
    }

    /// Transport for `url` reusing a configured client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            headers: RwLock::new(HeaderMap::new()),
            client,
        }
    }

    header_accessors!();
}

#[async_trait]
impl AsyncTransport for AsyncHttpTransport {
    async fn send_and_receive(&self, request: &str, id: u64) -> Result<RawResponse> {
        let response = self
            .client
            .post(&self.url)
            .headers(request_headers(&self.headers))
            .body(request.to_owned())
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        log_status(response.status(), id);

        let body = response.bytes().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok(RawResponse::Bytes(body.to_vec()))
    }
}
