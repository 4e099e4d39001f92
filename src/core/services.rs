use crate::core::YfError;
use futures::future::BoxFuture;

/// A source of crumbs for modules that call protected endpoints.
///
/// This decouples request-building code (quotes, search, screeners, ...) from how the
/// crumb is obtained, and makes it easy to substitute a fixed crumb in tests. It is
/// implemented by [`SessionManager`](crate::core::SessionManager) and
/// [`YfClient`](crate::core::YfClient).
pub trait CredentialService: Send + Sync {
    /// A currently-valid crumb, acquiring or refreshing it if needed.
    fn crumb(&self) -> BoxFuture<'_, Result<String, YfError>>;

    /// Discard the current credentials after the server rejected them, so the next
    /// [`crumb`](Self::crumb) call re-acquires them with the other strategy.
    fn invalidate(&self) -> BoxFuture<'_, ()>;
}
