//! HTTP collaborator abstraction
//!
//! Defines the `HttpGet` capability consumed by every extractor together
//! with a transport-agnostic response type. The SDK never creates a client
//! on its own; callers inject one (the feature-gated `ReqwestClient` or a
//! test fake), which keeps the extraction core free of hidden state.

use std::collections::HashMap;

use serde_json::Value;

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Request error: {0}")]
    Request(String),
}

/// A fetched response.
///
/// `status` is optional so minimal fakes can omit it; a missing status is
/// treated as success.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: Option<u16>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response around a JSON payload (handy for tests and fakes).
    pub fn from_json(payload: Value) -> Self {
        Self {
            status: Some(200),
            headers: HashMap::new(),
            body: serde_json::to_vec(&payload).unwrap_or_default(),
        }
    }

    /// Build a response around a text body with the given content type.
    pub fn from_text(text: &str, content_type: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status: Some(200),
            headers,
            body: text.as_bytes().to_vec(),
        }
    }

    /// Whether the response counts as a failure (status >= 400).
    pub fn is_error(&self) -> bool {
        matches!(self.status, Some(code) if code >= 400)
    }

    /// Decode the body as JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Decode the body as text, `None` when empty or whitespace only.
    pub fn text(&self) -> Option<String> {
        let decoded = String::from_utf8_lossy(&self.body);
        if decoded.trim().is_empty() {
            None
        } else {
            Some(decoded.into_owned())
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Heuristic: does this response (or its URL) look like an XML document?
    pub fn looks_like_xml(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        if url_lower.ends_with(".xsd") || url_lower.ends_with(".xml") {
            return true;
        }
        let content_type = self.header("Content-Type").unwrap_or("").to_lowercase();
        ["xml", "gml", "xsd"]
            .iter()
            .any(|marker| content_type.contains(marker))
    }
}

/// Trait for HTTP getters
///
/// Implementations perform one blocking GET. The basic-auth variant defaults
/// to the plain getter so single-signature implementations keep working.
pub trait HttpGet {
    /// Fetch a URL
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;

    /// Fetch a URL with optional basic-auth credentials
    fn get_with_auth(
        &self,
        url: &str,
        _auth: Option<(&str, &str)>,
    ) -> Result<HttpResponse, HttpError> {
        self.get(url)
    }
}

#[cfg(feature = "http-client")]
pub mod client;
