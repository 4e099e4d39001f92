//! yfinance-session: the session core of a Yahoo Finance client.
//!
//! Yahoo's JSON endpoints want a session cookie plus a short-lived "crumb" on every call,
//! and they drop clients that do not look like a browser. This crate provides:
//!
//! - [`Transport`]: HTTP with a fixed browser profile, a stored session cookie and a
//!   best-effort [`close`](Transport::close).
//! - [`SessionManager`]: acquires the crumb with either the basic cookie flow or the
//!   consent (CSRF) flow, falls back from one to the other, and refreshes it once per
//!   expiry no matter how many tasks ask at the same time.
//! - [`TtlCache`]: a small TTL cache, also available process-wide via
//!   [`cache::global`](core::cache::global).
//! - [`YfClient`]: the three wired together, with crumb injection and retries.
//!
//! ```no_run
//! # async fn run() -> Result<(), yfinance_session::YfError> {
//! use yfinance_session::{CacheMode, YfClient};
//! use url::Url;
//!
//! let client = YfClient::builder().build()?;
//! let crumb = client.session().get_token().await?;
//! let url = Url::parse("https://query1.finance.yahoo.com/v7/finance/quote")?;
//! let params = [("symbols".to_string(), "AAPL".to_string())].into_iter().collect();
//! let body = client.get_authenticated(&url, Some(params), CacheMode::Use).await?;
//! # let _ = (crumb, body);
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use core::cache;
pub use core::{
    Backoff, BrowserProfile, CacheMode, CredentialService, Endpoints, ErrorKind, QueryParams,
    Response, RetryConfig, SessionManager, Strategy, Transport, TransportBuilder, TtlCache,
    YfClient, YfClientBuilder, YfError, http_status_to_error,
};
pub use core::session::extract_hidden_input;
