use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum YfError {
    /// An error occurred during an HTTP request (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A response body could not be decoded as the expected JSON.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server returned an unexpected or unsuccessful HTTP status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The server answered with a 5xx status.
    #[error("Server error {status} at {url}")]
    ServerError {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found at {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The server is throttling this client (HTTP 429 or a rate-limit marker in the body).
    #[error("Rate limited at {url}")]
    RateLimited {
        /// The URL that was throttled.
        url: String,
    },

    /// Cookie/crumb acquisition failed or the server rejected our credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The body was not what the endpoint is expected to return.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The transport was closed before the request was issued.
    #[error("transport is closed")]
    Closed,
}

/// Coarse classification of a [`YfError`], for callers deciding whether to retry,
/// re-authenticate or give up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure, timeout, or a 5xx status.
    Network,
    /// Credentials are missing, rejected, or could not be acquired.
    Auth,
    /// The server is throttling requests.
    RateLimit,
    /// The resource does not exist.
    NotFound,
    /// The body could not be interpreted.
    InvalidResponse,
    /// Anything else, e.g. an uncategorized 4xx.
    Unknown,
}

impl YfError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            YfError::Http(_) | YfError::ServerError { .. } | YfError::Closed => ErrorKind::Network,
            YfError::Auth(_) => ErrorKind::Auth,
            YfError::RateLimited { .. } => ErrorKind::RateLimit,
            YfError::NotFound { .. } => ErrorKind::NotFound,
            YfError::Json(_) | YfError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            YfError::Url(_) | YfError::Status { .. } => ErrorKind::Unknown,
        }
    }

    /// `true` if this error is a timed-out request.
    pub fn is_timeout(&self) -> bool {
        matches!(self, YfError::Http(e) if e.is_timeout())
    }
}

/// Map an HTTP status code to the error it represents, if any.
///
/// Statuses below 400 are not errors. 401/403 become [`YfError::Auth`], 404
/// [`YfError::NotFound`], 429 [`YfError::RateLimited`], every 5xx
/// [`YfError::ServerError`]. Any other 4xx is reported as a plain [`YfError::Status`].
pub fn http_status_to_error(status: u16, url: &str) -> Result<(), YfError> {
    match status {
        s if s < 400 => Ok(()),
        401 | 403 => Err(YfError::Auth(format!("HTTP {status} at {url}"))),
        404 => Err(YfError::NotFound { url: url.to_string() }),
        429 => Err(YfError::RateLimited { url: url.to_string() }),
        500..=599 => Err(YfError::ServerError {
            status,
            url: url.to_string(),
        }),
        _ => Err(YfError::Status {
            status,
            url: url.to_string(),
        }),
    }
}
