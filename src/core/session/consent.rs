//! Scraping of the hidden form fields on the consent page.

use regex::Regex;
use std::sync::LazyLock;

static INPUT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("valid input-tag regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

/// Value of the `<input name="{name}" value="...">` element in `html`.
///
/// Attribute order and quote style do not matter. Returns an empty string when no input
/// with that name exists.
pub fn extract_hidden_input(html: &str, name: &str) -> String {
    for tag in INPUT_TAG.find_iter(html) {
        let mut found_name = false;
        let mut value = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let attr = caps.get(1).map_or("", |m| m.as_str());
            let val = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            if attr.eq_ignore_ascii_case("name") {
                found_name = val == name;
            } else if attr.eq_ignore_ascii_case("value") {
                value = Some(val);
            }
        }
        if found_name {
            return value.unwrap_or_default().to_string();
        }
    }
    String::new()
}

/// The `(csrfToken, sessionId)` pair the consent form posts back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConsentForm {
    pub(crate) csrf_token: String,
    pub(crate) session_id: String,
}

impl ConsentForm {
    /// Both fields must be present and non-empty.
    pub(crate) fn scrape(html: &str) -> Option<Self> {
        let csrf_token = extract_hidden_input(html, "csrfToken");
        let session_id = extract_hidden_input(html, "sessionId");
        if csrf_token.is_empty() || session_id.is_empty() {
            return None;
        }
        Some(Self {
            csrf_token,
            session_id,
        })
    }
}
