//! Core components of the `yfinance-session` crate.
//!
//! - The fingerprinted [`Transport`] every request goes through.
//! - The [`SessionManager`] that keeps the cookie and crumb fresh.
//! - The [`TtlCache`] primitive and its process-wide instance.
//! - The [`YfClient`] tying them together, and the primary [`YfError`] type.

/// In-memory TTL cache and the shared global instance.
pub mod cache;
/// The client (`YfClient`), builder, and retry/cache configuration.
pub mod client;
/// The primary error type (`YfError`) and status classification.
pub mod error;
/// Service traits consumed by request-building modules.
pub mod services;
/// Cookie/crumb acquisition strategies and the session manager.
pub mod session;
/// Fingerprinted HTTP transport.
pub mod transport;

// convenient re-exports so most code can just `use crate::core::YfClient`
pub use cache::TtlCache;
pub use client::{Backoff, CacheMode, RetryConfig, YfClient, YfClientBuilder};
pub use error::{ErrorKind, YfError, http_status_to_error};
pub use services::CredentialService;
pub use session::{Endpoints, SessionManager, Strategy};
pub use transport::{BrowserProfile, QueryParams, Response, Transport, TransportBuilder};
