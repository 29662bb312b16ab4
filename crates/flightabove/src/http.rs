//! HTTP fetch abstraction.
//!
//! Everything that talks to a remote API goes through [`HttpFetch`], so the
//! location resolver and flight providers can be exercised in tests with a
//! scripted client instead of the network.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// Default timeout applied when a request does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("flightabove/", env!("CARGO_PKG_VERSION"));

/// Transport-level failure: no HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("request to {url} failed: {message}")]
pub struct HttpError {
    /// The URL that was requested.
    pub url: String,
    /// Description of what went wrong.
    pub message: String,
}

impl HttpError {
    /// Create a new transport error.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// A GET request description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL without query string.
    pub url: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Query parameters.
    pub params: Vec<(String, String)>,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Create a GET request for `url` with the default timeout.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A received HTTP response. Any status code counts as a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Capability to perform HTTP GET requests.
#[async_trait::async_trait]
pub trait HttpFetch: Send + Sync + std::fmt::Debug {
    /// Perform the request.
    ///
    /// Returns `Ok` for every response that arrived, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if no response was received (DNS, connect,
    /// TLS, timeout, body read failure).
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// [`HttpFetch`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with the crate user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        trace!(url = %request.url, params = ?request.params, "sending request");

        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.params)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::new(&request.url, e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::new(&request.url, format!("failed to read body: {e}")))?;

        trace!(url = %request.url, status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted [`HttpFetch`] for tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::{HttpError, HttpFetch, HttpRequest, HttpResponse};

    type Reply = Result<HttpResponse, HttpError>;

    /// Answers requests whose URL contains a registered fragment.
    ///
    /// Routes are checked in registration order. Unmatched requests fail with
    /// a transport error. Every request is counted and recorded.
    #[derive(Debug, Default)]
    pub struct MockHttp {
        routes: Mutex<Vec<(String, Reply)>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockHttp {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_json(self, fragment: &str, status: u16, body: &serde_json::Value) -> Self {
            self.with_body(fragment, status, &body.to_string())
        }

        pub fn with_body(self, fragment: &str, status: u16, body: &str) -> Self {
            self.routes
                .lock()
                .push((fragment.to_string(), Ok(HttpResponse::new(status, body))));
            self
        }

        pub fn with_transport_error(self, fragment: &str) -> Self {
            self.routes.lock().push((
                fragment.to_string(),
                Err(HttpError::new(fragment, "connection refused")),
            ));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl HttpFetch for MockHttp {
        async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request.clone());
            self.routes
                .lock()
                .iter()
                .find(|(fragment, _)| request.url.contains(fragment.as_str()))
                .map_or_else(
                    || Err(HttpError::new(&request.url, "no route")),
                    |(_, reply)| reply.clone(),
                )
        }
    }
}
