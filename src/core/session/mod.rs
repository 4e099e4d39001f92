//! Cookie & crumb lifecycle.
//!
//! [`SessionManager`] hands out a crumb that is valid for [`DEFAULT_TOKEN_TTL`] after it was
//! acquired. A stale crumb is refreshed by exactly one task; every task that asked while the
//! refresh was running gets that refresh's outcome. If the active [`Strategy`] fails the
//! other one is tried, and the one that was tried last stays active for later refreshes.

mod consent;
mod strategy;

pub use consent::extract_hidden_input;
pub use strategy::{Endpoints, Strategy};

use crate::core::YfError;
use crate::core::cache::deadline_after;
use crate::core::services::CredentialService;
use crate::core::transport::{QueryParams, Transport};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// How long a crumb is trusted after acquisition.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Name of the query parameter carrying the crumb.
pub const CRUMB_PARAM: &str = "crumb";

#[derive(Debug, Default)]
struct SessionState {
    cookie: Option<String>,
    crumb: Option<String>,
    expires_at: Option<Instant>,
    strategy: Strategy,

    // Message of the last refresh if it failed; shared with the tasks that waited on it.
    last_failure: Option<String>,
}

impl SessionState {
    fn fresh_crumb(&self, now: Instant) -> Option<&str> {
        match (&self.crumb, self.expires_at) {
            (Some(c), Some(exp)) if now < exp => Some(c),
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.cookie = None;
        self.crumb = None;
        self.expires_at = None;
        self.last_failure = None;
    }
}

/// Acquires, caches and refreshes the session cookie and crumb.
#[derive(Debug)]
pub struct SessionManager {
    transport: Arc<Transport>,
    endpoints: Endpoints,
    token_ttl: Duration,
    state: RwLock<SessionState>,
    // Bumped under the write lock whenever a refresh completes or the state is cleared.
    // Read before any lock is taken, so a task queued behind a refresh can tell it ran.
    epoch: AtomicU64,
}

impl SessionManager {
    /// A manager talking to `endpoints` through `transport`, starting with [`Strategy::Basic`].
    pub fn new(transport: Arc<Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            token_ttl: DEFAULT_TOKEN_TTL,
            state: RwLock::new(SessionState::default()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Override how long an acquired crumb is trusted.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Start with `strategy` instead of [`Strategy::Basic`].
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.state.get_mut().strategy = strategy;
        self
    }

    /// Seed the manager with known credentials, valid for one token TTL from now.
    #[must_use]
    pub fn with_credentials(mut self, cookie: impl Into<String>, crumb: impl Into<String>) -> Self {
        let cookie = cookie.into();
        self.transport.set_cookie(cookie.clone());
        let ttl = self.token_ttl;
        let state = self.state.get_mut();
        state.cookie = Some(cookie);
        state.crumb = Some(crumb.into());
        state.expires_at = Some(deadline_after(Instant::now(), ttl));
        self
    }

    /// The transport used for every round trip.
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// The endpoints the protocols talk to.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The protocol the next refresh starts with.
    pub async fn strategy(&self) -> Strategy {
        self.state.read().await.strategy
    }

    /// The session cookie of the current credentials.
    pub async fn cookie(&self) -> Option<String> {
        self.state.read().await.cookie.clone()
    }

    /// When the current crumb goes stale, if one is held.
    pub async fn expires_at(&self) -> Option<Instant> {
        self.state.read().await.expires_at
    }

    /// A crumb that has not yet expired, refreshing it first if needed.
    ///
    /// Fails with [`YfError::Auth`] only when both strategies failed; the message names the
    /// step at which each of them gave up.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn get_token(&self) -> Result<String, YfError> {
        let seen_epoch = self.epoch.load(Ordering::Acquire);
        {
            let state = self.state.read().await;
            if let Some(crumb) = state.fresh_crumb(Instant::now()) {
                return Ok(crumb.to_string());
            }
        }

        let mut state = self.state.write().await;
        if let Some(crumb) = state.fresh_crumb(Instant::now()) {
            return Ok(crumb.to_string());
        }
        // A refresh finished while we were waiting for the lock and it failed.
        if self.epoch.load(Ordering::Acquire) != seen_epoch
            && let Some(msg) = &state.last_failure
        {
            return Err(YfError::Auth(msg.clone()));
        }

        self.refresh(&mut state).await
    }

    /// Copy of `params` (or a new map) with the `crumb` parameter set.
    pub async fn add_token_to_params(
        &self,
        params: Option<QueryParams>,
    ) -> Result<QueryParams, YfError> {
        let crumb = self.get_token().await?;
        let mut params = params.unwrap_or_default();
        params.insert(CRUMB_PARAM.to_string(), crumb);
        Ok(params)
    }

    /// Drop the cookie and crumb; the next [`get_token`](Self::get_token) re-acquires them
    /// with the same strategy.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.clear();
        self.bump_epoch();
        self.transport.clear_cookie();
    }

    /// Drop the cookie and crumb and make the other strategy active.
    pub async fn switch_strategy(&self) {
        let mut state = self.state.write().await;
        state.clear();
        self.bump_epoch();
        state.strategy = state.strategy.alternate();
        self.transport.clear_cookie();

        #[cfg(feature = "tracing")]
        tracing::debug!(strategy = %state.strategy, "session strategy switched");
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    async fn refresh(&self, state: &mut SessionState) -> Result<String, YfError> {
        let first = state.strategy;
        let outcome = match first.run(&self.transport, &self.endpoints).await {
            Ok(creds) => Ok(creds),
            Err(primary) => {
                let fallback = first.alternate();

                #[cfg(feature = "tracing")]
                tracing::warn!(failed = %first, error = %primary, next = %fallback, "crumb strategy failed, falling back");

                state.strategy = fallback;
                fallback
                    .run(&self.transport, &self.endpoints)
                    .await
                    .map_err(|secondary| {
                        format!(
                            "authentication failed: {first} strategy: {primary}; {fallback} strategy: {secondary}"
                        )
                    })
            }
        };
        self.bump_epoch();

        match outcome {
            Ok(creds) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(strategy = %state.strategy, "crumb refreshed");

                state.cookie = creds.cookie;
                state.crumb = Some(creds.crumb.clone());
                state.expires_at = Some(deadline_after(Instant::now(), self.token_ttl));
                state.last_failure = None;
                Ok(creds.crumb)
            }
            Err(msg) => {
                // The protocols cleared or half-set the transport cookie; put the held one back.
                match &state.cookie {
                    Some(c) => self.transport.set_cookie(c.clone()),
                    None => self.transport.clear_cookie(),
                }
                state.last_failure = Some(msg.clone());
                Err(YfError::Auth(msg))
            }
        }
    }
}

impl CredentialService for SessionManager {
    fn crumb(&self) -> BoxFuture<'_, Result<String, YfError>> {
        Box::pin(self.get_token())
    }

    fn invalidate(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.switch_strategy())
    }
}
