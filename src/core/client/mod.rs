//! Public client surface + builder.
//! Internals are split into `request` (crumb-aware requests), `retry` (backoff/cache modes)
//! and `constants` (default endpoints).

pub(crate) mod constants;
mod request;
mod retry;

pub use retry::{Backoff, CacheMode, RetryConfig};

use crate::core::YfError;
use crate::core::cache::TtlCache;
use crate::core::services::CredentialService;
use crate::core::session::{Endpoints, SessionManager, Strategy};
use crate::core::transport::{BrowserProfile, Transport};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One logical connection to Yahoo: a shared transport, the session manager that keeps its
/// crumb fresh, and an optional response cache.
///
/// Cloning is cheap and every clone shares the same transport, credentials and cache.
#[derive(Debug, Clone)]
pub struct YfClient {
    transport: Arc<Transport>,
    session: Arc<SessionManager>,
    cache: Option<Arc<TtlCache>>,
    retry: RetryConfig,
}

impl Default for YfClient {
    fn default() -> Self {
        Self::builder().build().expect("default client")
    }
}

impl YfClient {
    /// Create a new builder.
    pub fn builder() -> YfClientBuilder {
        YfClientBuilder::default()
    }

    /// The shared transport, for modules that build their own requests.
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// The session manager owning the cookie and crumb.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// The response cache, if enabled.
    pub fn cache(&self) -> Option<&Arc<TtlCache>> {
        self.cache.as_ref()
    }

    /// `true` if responses are cached.
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// The retry policy applied to authenticated requests.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Release the transport engine and, if this is the last handle on it, stop the cache.
    pub fn close(self) {
        self.transport.close();
        if let Some(cache) = self.cache.and_then(Arc::into_inner) {
            cache.close();
        }
    }
}

impl CredentialService for YfClient {
    fn crumb(&self) -> BoxFuture<'_, Result<String, YfError>> {
        Box::pin(self.session.get_token())
    }

    fn invalidate(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.session.switch_strategy())
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct YfClientBuilder {
    profile: Option<BrowserProfile>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,

    cookie_url: Option<Url>,
    crumb_url: Option<Url>,
    crumb_url_alt: Option<Url>,
    consent_url: Option<Url>,
    consent_collect_url: Option<Url>,
    consent_copy_url: Option<Url>,

    token_ttl: Option<Duration>,
    strategy: Option<Strategy>,
    preauth: Option<(String, String)>,

    cache_ttl: Option<Duration>,
    retry: Option<RetryConfig>,
}

impl YfClientBuilder {
    /// Browser profile presented on the wire. Default: [`BrowserProfile::Chrome120`].
    pub fn profile(mut self, profile: BrowserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Override the User-Agent (defaults to the profile's).
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the per-request timeout. Default: 30s.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Override the cookie bootstrap URL.
    pub fn cookie_url(mut self, url: Url) -> Self {
        self.cookie_url = Some(url);
        self
    }

    /// Override the crumb URL used by the basic strategy.
    pub fn crumb_url(mut self, url: Url) -> Self {
        self.crumb_url = Some(url);
        self
    }

    /// Override the crumb URL used by the consent strategy.
    pub fn crumb_url_alt(mut self, url: Url) -> Self {
        self.crumb_url_alt = Some(url);
        self
    }

    /// Override the consent page URL.
    pub fn consent_url(mut self, url: Url) -> Self {
        self.consent_url = Some(url);
        self
    }

    /// Override the consent form target URL.
    pub fn consent_collect_url(mut self, url: Url) -> Self {
        self.consent_collect_url = Some(url);
        self
    }

    /// Override the consent copy URL.
    pub fn consent_copy_url(mut self, url: Url) -> Self {
        self.consent_copy_url = Some(url);
        self
    }

    /// How long an acquired crumb is trusted. Default: one hour.
    pub fn token_ttl(mut self, dur: Duration) -> Self {
        self.token_ttl = Some(dur);
        self
    }

    /// The strategy the first refresh starts with. Default: [`Strategy::Basic`].
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Enable in-memory caching of authenticated responses with a default TTL.
    /// If not set, caching is disabled.
    pub fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self
    }

    /// Replace the retry policy.
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Turn automatic retries on or off, keeping the rest of the policy.
    pub fn retry_enabled(mut self, enabled: bool) -> Self {
        let mut cfg = self.retry.take().unwrap_or_default();
        cfg.enabled = enabled;
        self.retry = Some(cfg);
        self
    }

    #[doc(hidden)]
    /// Provide credentials up front and skip the first cookie/crumb fetch (tests).
    pub fn _preauth(mut self, cookie: impl Into<String>, crumb: impl Into<String>) -> Self {
        self.preauth = Some((cookie.into(), crumb.into()));
        self
    }

    /// Build the client. Nothing touches the network until the first request.
    pub fn build(self) -> Result<YfClient, YfError> {
        let defaults = Endpoints::yahoo()?;
        let endpoints = Endpoints {
            cookie: self.cookie_url.unwrap_or(defaults.cookie),
            crumb: self.crumb_url.unwrap_or(defaults.crumb),
            crumb_alt: self.crumb_url_alt.unwrap_or(defaults.crumb_alt),
            consent: self.consent_url.unwrap_or(defaults.consent),
            consent_collect: self.consent_collect_url.unwrap_or(defaults.consent_collect),
            consent_copy: self.consent_copy_url.unwrap_or(defaults.consent_copy),
        };

        let mut tb = Transport::builder().profile(self.profile.unwrap_or_default());
        if let Some(ua) = self.user_agent {
            tb = tb.user_agent(ua);
        }
        if let Some(t) = self.timeout {
            tb = tb.timeout(t);
        }
        if let Some(ct) = self.connect_timeout {
            tb = tb.connect_timeout(ct);
        }
        let transport = Arc::new(tb.build());

        let mut session = SessionManager::new(Arc::clone(&transport), endpoints)
            .with_strategy(self.strategy.unwrap_or_default());
        if let Some(ttl) = self.token_ttl {
            session = session.with_token_ttl(ttl);
        }
        if let Some((cookie, crumb)) = self.preauth {
            session = session.with_credentials(cookie, crumb);
        }

        Ok(YfClient {
            transport,
            session: Arc::new(session),
            cache: self.cache_ttl.map(|ttl| Arc::new(TtlCache::new(ttl))),
            retry: self.retry.unwrap_or_default(),
        })
    }
}
