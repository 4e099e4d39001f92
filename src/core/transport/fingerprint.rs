//! Browser profiles presented on the wire.
//!
//! A profile pins the user agent together with the header set and TLS settings a real
//! browser of that version sends, so every request from one [`Transport`](super::Transport)
//! looks like it came from the same browser.

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderName, HeaderValue};

/// A fixed browser identity used for every request of a transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BrowserProfile {
    /// Desktop Chrome 120 on Windows.
    #[default]
    Chrome120,
    /// Desktop Chrome 122 on Linux.
    Chrome122,
    /// Desktop Firefox 121 on Windows.
    Firefox121,
    /// Safari 17 on macOS.
    Safari17,
}

impl BrowserProfile {
    /// Stable identifier for the fingerprint, e.g. `chrome_120`.
    pub fn identifier(self) -> &'static str {
        match self {
            BrowserProfile::Chrome120 => "chrome_120",
            BrowserProfile::Chrome122 => "chrome_122",
            BrowserProfile::Firefox121 => "firefox_121",
            BrowserProfile::Safari17 => "safari_17",
        }
    }

    /// The user agent that matches this profile.
    pub fn user_agent(self) -> &'static str {
        match self {
            BrowserProfile::Chrome120 => concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
                "AppleWebKit/537.36 (KHTML, like Gecko) ",
                "Chrome/120.0.0.0 Safari/537.36"
            ),
            BrowserProfile::Chrome122 => concat!(
                "Mozilla/5.0 (X11; Linux x86_64) ",
                "AppleWebKit/537.36 (KHTML, like Gecko) ",
                "Chrome/122.0.0.0 Safari/537.36"
            ),
            BrowserProfile::Firefox121 => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0"
            }
            BrowserProfile::Safari17 => concat!(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
                "AppleWebKit/605.1.15 (KHTML, like Gecko) ",
                "Version/17.2 Safari/605.1.15"
            ),
        }
    }

    /// Look a profile up by its [`identifier`](Self::identifier).
    pub fn from_identifier(id: &str) -> Option<Self> {
        [
            BrowserProfile::Chrome120,
            BrowserProfile::Chrome122,
            BrowserProfile::Firefox121,
            BrowserProfile::Safari17,
        ]
        .into_iter()
        .find(|p| p.identifier().eq_ignore_ascii_case(id))
    }

    fn accept(self) -> &'static str {
        match self {
            BrowserProfile::Chrome120 | BrowserProfile::Chrome122 => concat!(
                "text/html,application/xhtml+xml,application/xml;q=0.9,",
                "image/avif,image/webp,image/apng,*/*;q=0.8"
            ),
            BrowserProfile::Firefox121 => {
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
            }
            BrowserProfile::Safari17 => {
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
            }
        }
    }

    fn client_hints(self) -> &'static [(&'static str, &'static str)] {
        match self {
            BrowserProfile::Chrome120 => &[
                (
                    "sec-ch-ua",
                    "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
                ),
                ("sec-ch-ua-mobile", "?0"),
                ("sec-ch-ua-platform", "\"Windows\""),
            ],
            BrowserProfile::Chrome122 => &[
                (
                    "sec-ch-ua",
                    "\"Chromium\";v=\"122\", \"Not(A:Brand\";v=\"24\", \"Google Chrome\";v=\"122\"",
                ),
                ("sec-ch-ua-mobile", "?0"),
                ("sec-ch-ua-platform", "\"Linux\""),
            ],
            BrowserProfile::Firefox121 | BrowserProfile::Safari17 => &[],
        }
    }

    /// Headers attached to every request made with this profile.
    ///
    /// Always includes `Accept`, `Accept-Language` and `Connection: keep-alive`; Chromium
    /// profiles add their client hints.
    pub fn default_headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(self.accept()));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        for (name, value) in self.client_hints() {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        headers
    }
}

impl std::fmt::Display for BrowserProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}
