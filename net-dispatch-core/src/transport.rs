//! Transport collaborator
//!
//! The data layer hands request descriptors to a [`Transport`] and receives
//! raw JSON responses (or a [`TransportError`]) back. Retry policy, if any,
//! belongs here or below, never in the dispatch layer.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::http::{HttpMethod, HttpRequest};

/// Errors raised while performing a request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response body could not be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, best effort.
        body: String,
    },

    /// Transport-level failure that is not tied to a reqwest error.
    /// Used by mock transports and timeout wrappers.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Performs HTTP requests on behalf of the data layer.
///
/// Implementations resolve the descriptor against their own base URL and
/// return the decoded JSON body on success. Exactly one terminal outcome
/// occurs per issued request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the described request and decode the response as JSON.
    async fn issue(&self, request: &HttpRequest) -> Result<Value, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport against the given base URL with a fresh client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a transport reusing an existing client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn issue(&self, request: &HttpRequest) -> Result<Value, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, self.url_for(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
