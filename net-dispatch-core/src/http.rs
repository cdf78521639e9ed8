//! HTTP request descriptors
//!
//! Handlers never talk to the network. They build an [`HttpRequest`]
//! describing the call, and a [`Transport`](crate::Transport) collaborator
//! performs it. Keeping the descriptor inert makes handlers pure and easy to
//! test.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method for a request descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Get the method as its wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative description of an outbound HTTP request.
///
/// The path is relative to the transport's base URL. Bodies are JSON.
///
/// # Example
/// ```
/// use net_dispatch_core::HttpRequest;
/// use serde_json::json;
///
/// let request = HttpRequest::post("/sites/1/posts/5/likes/new").with_body(json!({}));
/// assert_eq!(request.path, "/sites/1/posts/5/likes/new");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the transport's base URL.
    pub path: String,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Create a request descriptor with the given method and path.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a GET request descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request descriptor.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query string parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}
