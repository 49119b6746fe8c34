//! Blocking reqwest-backed HTTP getter

use std::time::Duration;

use super::{HttpError, HttpGet, HttpResponse};

/// Default `HttpGet` implementation built on `reqwest::blocking`.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Create a client with the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| HttpError::Request(err.to_string()))?;
        Ok(Self { client })
    }

    fn convert(response: reqwest::blocking::Response) -> Result<HttpResponse, HttpError> {
        let status = Some(response.status().as_u16());
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|text| (name.to_string(), text.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|err| HttpError::Request(err.to_string()))?
            .to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(30)).unwrap_or_else(|_| Self {
            client: reqwest::blocking::Client::new(),
        })
    }
}

impl HttpGet for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| HttpError::Request(err.to_string()))?;
        Self::convert(response)
    }

    fn get_with_auth(
        &self,
        url: &str,
        auth: Option<(&str, &str)>,
    ) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.get(url);
        if let Some((username, password)) = auth {
            request = request.basic_auth(username, Some(password));
        }
        let response = request
            .send()
            .map_err(|err| HttpError::Request(err.to_string()))?;
        Self::convert(response)
    }
}
