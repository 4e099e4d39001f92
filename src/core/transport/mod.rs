//! Fingerprinted HTTP transport shared by every request of a client.
//!
//! The underlying `reqwest` engine is built lazily on the first request and exactly once,
//! even when many tasks race on that first request. The stored session cookie is attached
//! to every `GET` and JSON `POST`.

mod fingerprint;
mod response;

pub use fingerprint::BrowserProfile;
pub use response::Response;

use crate::core::YfError;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Query-string parameters, kept sorted so request URLs are stable cache keys.
pub type QueryParams = BTreeMap<String, String>;

/// Default overall request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The lazily-built request engine. `None` once released by [`Transport::close`].
#[derive(Debug)]
struct Engine {
    http: Mutex<Option<reqwest::Client>>,
}

impl Engine {
    fn client(&self) -> Option<reqwest::Client> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take(&self) -> Option<reqwest::Client> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// HTTP transport presenting one fixed [`BrowserProfile`] on every request.
#[derive(Debug)]
pub struct Transport {
    timeout: Duration,
    connect_timeout: Option<Duration>,
    profile: BrowserProfile,
    user_agent: String,

    engine: OnceCell<Engine>,
    closed: AtomicBool,
    cookie: RwLock<Option<String>>,
}

impl Default for Transport {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Transport {
    /// Create a new builder.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    /// The browser profile this transport presents.
    pub fn profile(&self) -> BrowserProfile {
        self.profile
    }

    /// The user agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `true` once the first request has built the engine.
    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    /// `true` after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Store the session cookie attached to subsequent `GET`/JSON `POST` requests.
    pub fn set_cookie(&self, value: impl Into<String>) {
        *self.cookie.write().unwrap_or_else(PoisonError::into_inner) = Some(value.into());
    }

    /// The stored session cookie, if any.
    pub fn cookie(&self) -> Option<String> {
        self.cookie
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the stored session cookie.
    pub fn clear_cookie(&self) {
        *self.cookie.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// `GET url?params`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err, fields(url = %url)))]
    pub async fn get(&self, url: &Url, params: Option<&QueryParams>) -> Result<Response, YfError> {
        let http = self.http().await?;
        let mut req = http.get(url.clone());
        if let Some(p) = params {
            req = req.query(p);
        }
        self.send(self.with_cookie(req)).await
    }

    /// `POST url?params` with a URL-encoded form body.
    ///
    /// Keys may repeat; pairs are encoded in the given order.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err, fields(url = %url)))]
    pub async fn post(
        &self,
        url: &Url,
        params: Option<&QueryParams>,
        form: &[(&str, &str)],
    ) -> Result<Response, YfError> {
        let http = self.http().await?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let mut req = http
            .post(url.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body);
        if let Some(p) = params {
            req = req.query(p);
        }
        self.send(req).await
    }

    /// `POST url?params` with a JSON body.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err, fields(url = %url)))]
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        params: Option<&QueryParams>,
        body: &B,
    ) -> Result<Response, YfError> {
        let http = self.http().await?;
        let mut req = http.post(url.clone()).json(body);
        if let Some(p) = params {
            req = req.query(p);
        }
        self.send(self.with_cookie(req)).await
    }

    /// `GET` and decode the body as JSON.
    ///
    /// A status of 400 or above is reported as [`YfError::Status`]; a body that is not
    /// valid JSON for `T` as [`YfError::Json`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: Option<&QueryParams>,
    ) -> Result<T, YfError> {
        let resp = self.get(url, params).await?;
        if resp.status() >= 400 {
            return Err(YfError::Status {
                status: resp.status(),
                url: resp.url().to_string(),
            });
        }
        resp.json()
    }

    /// Release the engine. Idempotent.
    ///
    /// Releasing is best effort: a fault raised while tearing the engine down is logged
    /// and discarded. Requests issued afterwards fail with [`YfError::Closed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(engine) = self.engine.get() else {
            return;
        };
        let client = engine.take();
        release_best_effort(move || drop(client));
    }

    async fn http(&self) -> Result<reqwest::Client, YfError> {
        if self.is_closed() {
            return Err(YfError::Closed);
        }
        let engine = self
            .engine
            .get_or_try_init(|| async { self.build_engine() })
            .await?;
        if self.is_closed() {
            return Err(YfError::Closed);
        }
        engine.client().ok_or(YfError::Closed)
    }

    fn build_engine(&self) -> Result<Engine, YfError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(profile = %self.profile, "building transport engine");

        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(self.profile.default_headers())
            .cookie_store(true)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .timeout(self.timeout);
        if let Some(ct) = self.connect_timeout {
            builder = builder.connect_timeout(ct);
        }
        Ok(Engine {
            http: Mutex::new(Some(builder.build()?)),
        })
    }

    fn with_cookie(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.cookie() {
            Some(c) if !c.is_empty() => req.header(COOKIE, c),
            _ => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Response, YfError> {
        let resp = req.send().await?;
        let resp = Response::read(resp).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(status = resp.status(), url = resp.url(), "response received");

        Ok(resp)
    }
}

/// Run `release`, swallowing any panic it raises. Returns `false` if it panicked.
fn release_best_effort<F: FnOnce()>(release: F) -> bool {
    match catch_unwind(AssertUnwindSafe(release)) {
        Ok(()) => true,
        Err(_fault) => {
            #[cfg(feature = "tracing")]
            {
                let msg = _fault
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| _fault.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                tracing::warn!(fault = %msg, "ignored fault while releasing transport engine");
            }
            false
        }
    }
}

/* ----------------------- Builder ----------------------- */

/// Builder for [`Transport`].
#[derive(Debug, Default, Clone)]
pub struct TransportBuilder {
    profile: Option<BrowserProfile>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl TransportBuilder {
    /// Browser profile to present. Default: [`BrowserProfile::Chrome120`].
    pub fn profile(mut self, profile: BrowserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Override the User-Agent. Defaults to the profile's own user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Overall per-request timeout. Default: 30s.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Connect timeout. Default: none.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Build the transport. No network resources are allocated until the first request.
    pub fn build(self) -> Transport {
        let profile = self.profile.unwrap_or_default();
        Transport {
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout,
            profile,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| profile.user_agent().to_string()),
            engine: OnceCell::new(),
            closed: AtomicBool::new(false),
            cookie: RwLock::new(None),
        }
    }
}
