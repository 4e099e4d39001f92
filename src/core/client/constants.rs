//! Centralized constants for default endpoints and the consent form.

/// A URL that returns a Set-Cookie header for Yahoo domains.
pub(crate) const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

/// URL to fetch a crumb (requires cookie from `DEFAULT_COOKIE_URL`).
pub(crate) const DEFAULT_CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// Crumb URL used after the consent flow.
pub(crate) const DEFAULT_CRUMB_URL_ALT: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";

/// Consent page with the hidden `csrfToken` and `sessionId` inputs.
pub(crate) const DEFAULT_CONSENT_URL: &str = "https://guce.yahoo.com/consent";

/// Target of the consent form.
pub(crate) const DEFAULT_CONSENT_COLLECT_URL: &str = "https://consent.yahoo.com/v2/collectConsent";

/// Copies the collected consent onto the finance domain.
pub(crate) const DEFAULT_CONSENT_COPY_URL: &str = "https://guce.yahoo.com/copyConsent";

/// `originalDoneUrl` field of the consent form.
pub(crate) const CONSENT_DONE_URL: &str = "https://finance.yahoo.com/";

/// `namespace` field of the consent form.
pub(crate) const CONSENT_NAMESPACE: &str = "yahoo";

/// Body text Yahoo serves instead of a crumb when throttling.
pub(crate) const RATE_LIMIT_MARKER: &str = "Too Many Requests";

/// Body text of a quoteSummary-style error when the crumb was rejected.
pub(crate) const INVALID_CRUMB_MARKER: &str = "Invalid Crumb";
