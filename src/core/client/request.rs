//! Crumb-aware requests with retry and response caching.

use super::constants::INVALID_CRUMB_MARKER;
use super::{CacheMode, RetryConfig, YfClient};
use crate::core::YfError;
use crate::core::session::CRUMB_PARAM;
use crate::core::transport::{QueryParams, Response};
use serde::de::DeserializeOwned;
use std::future::Future;
use url::Url;

impl YfClient {
    /// Run `send` until it yields a non-retryable outcome or the retry budget is spent.
    ///
    /// `send` is called once per attempt; the last outcome is returned as-is.
    pub async fn send_with_retry<F, Fut>(
        &self,
        mut send: F,
        retry_override: Option<&RetryConfig>,
    ) -> Result<Response, YfError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Response, YfError>>,
    {
        let cfg = retry_override.unwrap_or(&self.retry);
        let mut attempt = 0u32;
        loop {
            let outcome = send().await;
            if !cfg.enabled || attempt >= cfg.max_retries || !should_retry(cfg, &outcome) {
                return outcome;
            }

            let delay = cfg.backoff.delay(attempt);
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, ?delay, "retrying request");

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// `GET url?params&crumb=...` and return the body.
    ///
    /// If the server rejects the crumb (401/403 or an `Invalid Crumb` body), the session is
    /// switched to the other strategy and the request is sent once more with a fresh crumb.
    /// Other statuses of 400 and above are classified with
    /// [`http_status_to_error`](crate::core::http_status_to_error). Successful bodies are
    /// cached under the URL without the crumb, as directed by `cache_mode`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err, fields(url = %url)))]
    pub async fn get_authenticated(
        &self,
        url: &Url,
        params: Option<QueryParams>,
        cache_mode: CacheMode,
    ) -> Result<String, YfError> {
        let key = cache_key(url, params.as_ref());
        if cache_mode == CacheMode::Use
            && let Some(cache) = &self.cache
            && let Some(body) = cache.get_string(&key).await
        {
            return Ok(body);
        }

        let mut reauthenticated = false;
        let resp = loop {
            let query = self.session.add_token_to_params(params.clone()).await?;
            let resp = self
                .send_with_retry(|| self.transport.get(url, Some(&query)), None)
                .await?;

            if !reauthenticated && is_crumb_rejection(&resp) {
                #[cfg(feature = "tracing")]
                tracing::warn!(status = resp.status(), "crumb rejected, switching strategy");

                self.session.switch_strategy().await;
                reauthenticated = true;
                continue;
            }
            break resp.error_for_status()?;
        };

        let body = resp.into_text();
        if cache_mode != CacheMode::Bypass
            && let Some(cache) = &self.cache
        {
            cache.set(key, body.clone()).await;
        }
        Ok(body)
    }

    /// [`get_authenticated`](Self::get_authenticated) and decode the body as JSON.
    pub async fn get_json_authenticated<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: Option<QueryParams>,
        cache_mode: CacheMode,
    ) -> Result<T, YfError> {
        let body = self.get_authenticated(url, params, cache_mode).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn should_retry(cfg: &RetryConfig, outcome: &Result<Response, YfError>) -> bool {
    match outcome {
        Ok(resp) => cfg.retry_on_status.contains(&resp.status()),
        Err(YfError::Http(e)) => {
            (cfg.retry_on_timeout && e.is_timeout()) || (cfg.retry_on_connect && e.is_connect())
        }
        Err(_) => false,
    }
}

fn is_crumb_rejection(resp: &Response) -> bool {
    matches!(resp.status(), 401 | 403) || resp.text().contains(INVALID_CRUMB_MARKER)
}

fn cache_key(url: &Url, params: Option<&QueryParams>) -> String {
    let mut u = url.clone();
    let pairs: Vec<(&String, &String)> = params
        .into_iter()
        .flatten()
        .filter(|(k, _)| k.as_str() != CRUMB_PARAM)
        .collect();
    if !pairs.is_empty() {
        u.query_pairs_mut().extend_pairs(pairs);
    }
    u.into()
}
