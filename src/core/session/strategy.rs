//! The two cookie/crumb acquisition protocols.

use super::consent::ConsentForm;
use crate::core::YfError;
use crate::core::client::constants::{
    CONSENT_DONE_URL, CONSENT_NAMESPACE, DEFAULT_CONSENT_COLLECT_URL, DEFAULT_CONSENT_COPY_URL,
    DEFAULT_CONSENT_URL, DEFAULT_COOKIE_URL, DEFAULT_CRUMB_URL, DEFAULT_CRUMB_URL_ALT,
    RATE_LIMIT_MARKER,
};
use crate::core::error::http_status_to_error;
use crate::core::transport::{QueryParams, Response, Transport};
use reqwest::header::SET_COOKIE;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Which acquisition protocol the session manager runs first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Cookie endpoint, then crumb endpoint.
    #[default]
    Basic,
    /// Consent page, consent collect, consent copy, then crumb endpoint.
    Csrf,
}

impl Strategy {
    /// The other protocol.
    pub fn alternate(self) -> Self {
        match self {
            Strategy::Basic => Strategy::Csrf,
            Strategy::Csrf => Strategy::Basic,
        }
    }

    pub(crate) async fn run(
        self,
        transport: &Transport,
        endpoints: &Endpoints,
    ) -> Result<Credentials, StepError> {
        match self {
            Strategy::Basic => run_basic(transport, endpoints).await,
            Strategy::Csrf => run_csrf(transport, endpoints).await,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Basic => "basic",
            Strategy::Csrf => "csrf",
        })
    }
}

/// URLs the acquisition protocols talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Issues the session cookie (basic).
    pub cookie: Url,
    /// Issues the crumb (basic).
    pub crumb: Url,
    /// Issues the crumb (csrf).
    pub crumb_alt: Url,
    /// Consent page carrying the hidden `csrfToken`/`sessionId` inputs.
    pub consent: Url,
    /// Consent form target.
    pub consent_collect: Url,
    /// Consent copy step.
    pub consent_copy: Url,
}

impl Endpoints {
    /// The production Yahoo endpoints.
    pub fn yahoo() -> Result<Self, YfError> {
        Ok(Self {
            cookie: Url::parse(DEFAULT_COOKIE_URL)?,
            crumb: Url::parse(DEFAULT_CRUMB_URL)?,
            crumb_alt: Url::parse(DEFAULT_CRUMB_URL_ALT)?,
            consent: Url::parse(DEFAULT_CONSENT_URL)?,
            consent_collect: Url::parse(DEFAULT_CONSENT_COLLECT_URL)?,
            consent_copy: Url::parse(DEFAULT_CONSENT_COPY_URL)?,
        })
    }
}

/// What a successful protocol run yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) cookie: Option<String>,
    pub(crate) crumb: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Cookie,
    Consent,
    Collect,
    Copy,
    Token,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Cookie => "cookie step",
            Step::Consent => "consent step",
            Step::Collect => "consent collect step",
            Step::Copy => "consent copy step",
            Step::Token => "token step",
        })
    }
}

/// A protocol failure, tagged with the step that failed.
#[derive(Debug, Error)]
#[error("{step}: {source}")]
pub(crate) struct StepError {
    pub(crate) step: Step,
    #[source]
    pub(crate) source: YfError,
}

impl Step {
    fn fail(self, source: YfError) -> StepError {
        StepError { step: self, source }
    }
}

async fn run_basic(transport: &Transport, ep: &Endpoints) -> Result<Credentials, StepError> {
    transport.clear_cookie();

    // fc.yahoo.com answers 404 but still sets the cookie, so the status is ignored here.
    let resp = transport
        .get(&ep.cookie, None)
        .await
        .map_err(|e| Step::Cookie.fail(e))?;
    let cookie = session_cookie(&resp).ok_or_else(|| {
        Step::Cookie.fail(YfError::Auth(format!(
            "No cookie received from {}",
            ep.cookie
        )))
    })?;
    transport.set_cookie(cookie.clone());

    let crumb = fetch_crumb(transport, &ep.crumb)
        .await
        .map_err(|e| Step::Token.fail(e))?;

    Ok(Credentials {
        cookie: Some(cookie),
        crumb,
    })
}

async fn run_csrf(transport: &Transport, ep: &Endpoints) -> Result<Credentials, StepError> {
    transport.clear_cookie();

    let page = transport
        .get(&ep.consent, None)
        .await
        .map_err(|e| Step::Consent.fail(e))?;
    let form = ConsentForm::scrape(page.text()).ok_or_else(|| {
        Step::Consent.fail(YfError::InvalidResponse(
            "consent page is missing csrfToken or sessionId".into(),
        ))
    })?;
    let mut cookie = session_cookie(&page);

    let mut params = QueryParams::new();
    params.insert("sessionId".into(), form.session_id.clone());

    let payload = [
        ("agree", "agree"),
        ("agree", "agree"),
        ("consentUUID", "default"),
        ("sessionId", form.session_id.as_str()),
        ("csrfToken", form.csrf_token.as_str()),
        ("originalDoneUrl", CONSENT_DONE_URL),
        ("namespace", CONSENT_NAMESPACE),
    ];
    let collected = transport
        .post(&ep.consent_collect, Some(&params), &payload)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Step::Collect.fail(e))?;
    cookie = session_cookie(&collected).or(cookie);

    let copied = transport
        .get(&ep.consent_copy, Some(&params))
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Step::Copy.fail(e))?;
    cookie = session_cookie(&copied).or(cookie);

    if let Some(c) = &cookie {
        transport.set_cookie(c.clone());
    }

    let crumb = fetch_crumb(transport, &ep.crumb_alt)
        .await
        .map_err(|e| Step::Token.fail(e))?;

    Ok(Credentials { cookie, crumb })
}

async fn fetch_crumb(transport: &Transport, url: &Url) -> Result<String, YfError> {
    let resp = transport.get(url, None).await?;
    validate_crumb(&resp)
}

/// Accept a crumb response only if it looks like a real crumb.
pub(crate) fn validate_crumb(resp: &Response) -> Result<String, YfError> {
    if resp.status() == 429 || resp.text().contains(RATE_LIMIT_MARKER) {
        return Err(YfError::RateLimited {
            url: resp.url().to_string(),
        });
    }
    http_status_to_error(resp.status(), resp.url())?;

    let crumb = resp.text().trim();
    if crumb.is_empty() {
        return Err(YfError::InvalidResponse("empty crumb".into()));
    }
    if crumb.to_ascii_lowercase().contains("<html") {
        return Err(YfError::InvalidResponse(
            "crumb endpoint returned an HTML page".into(),
        ));
    }
    if crumb.contains('{') || crumb.contains('<') {
        return Err(YfError::InvalidResponse(format!(
            "Received invalid crumb: {crumb}"
        )));
    }
    Ok(crumb.to_string())
}

/// `name=value` pairs of every `Set-Cookie` header, joined into one `Cookie` value.
pub(crate) fn session_cookie(resp: &Response) -> Option<String> {
    let pairs: Vec<&str> = resp
        .header_all(SET_COOKIE.as_str())
        .into_iter()
        .filter_map(|sc| sc.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
