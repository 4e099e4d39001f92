use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::core::YfError;
use crate::core::error::http_status_to_error;

/// A fully-read HTTP response: status, headers and body text.
///
/// The body is read eagerly so the response can be inspected more than once and
/// classified by the caller.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    url: String,
    headers: HeaderMap,
    body: String,
}

impl Response {
    pub(crate) async fn read(resp: reqwest::Response) -> Result<Self, YfError> {
        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let headers = resp.headers().clone();
        let body = resp.text().await?;
        Ok(Self {
            status,
            url,
            headers,
            body,
        })
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Final URL of the request (after redirects).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of `name` that is valid UTF-8, in arrival order.
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// The body as text.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Consume the response and take the body.
    pub fn into_text(self) -> String {
        self.body
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with the status classification when `status >= 400`.
    pub fn error_for_status(self) -> Result<Self, YfError> {
        http_status_to_error(self.status, &self.url)?;
        Ok(self)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, YfError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
