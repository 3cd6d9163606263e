//! Inbound push payload parsing.
//!
//! Toast pushes arrive as a query-string encoded parameter blob. Parsing is
//! total: malformed values degrade to defaults, never to an error, because a
//! push that reaches the device must always be deliverable to the app.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// A parsed inbound push notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToastPush {
    /// Opaque push text shown to the user.
    pub content: String,
    /// Dedup/open-tracking hash, used to key the push-open statistic.
    pub hash: String,
    /// Backend HTML content id; `-1` when the push carries none.
    pub html_id: i64,
    /// Opaque user data attached by the sender.
    pub user_data: String,
    /// Absolute URL to open when the push is accepted, if any.
    pub url: Option<Url>,
    /// Whether this push launched the application (as opposed to arriving
    /// while it was running).
    pub on_start: bool,
}

impl ToastPush {
    /// Parses a push from its query-string encoded payload.
    ///
    /// Recognized keys: `content`, `p` (hash), `h` (html id), `u` (user
    /// data), `l` (URL). All values are percent-decoded. Unknown keys are
    /// ignored; a key without a value maps to the empty string. An `h` that
    /// is not an integer yields `-1`; an `l` that is not an absolute URL
    /// yields `None`.
    #[must_use]
    pub fn parse(payload: &str) -> Self {
        let params = parse_query_string(payload);

        let decoded = |key: &str| {
            params
                .get(key)
                .map(|v| percent_decode(v))
                .unwrap_or_default()
        };

        let html_id = params
            .get("h")
            .and_then(|v| percent_decode(v).parse::<i64>().ok())
            .unwrap_or(-1);

        let url = params
            .get("l")
            .and_then(|v| Url::parse(&percent_decode(v)).ok());

        Self {
            content: decoded("content"),
            hash: decoded("p"),
            html_id,
            user_data: decoded("u"),
            url,
            on_start: false,
        }
    }

    /// Whether accepting this push should open external content (a direct
    /// URL or a backend-hosted HTML page).
    #[must_use]
    pub fn has_external_content(&self) -> bool {
        self.url.is_some() || self.html_id != -1
    }
}

fn percent_decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// Splits a query string into key/value pairs.
///
/// Anything up to and including the first `?` is dropped, so full URLs and
/// bare query strings are both accepted. A pair without `=` maps the key to
/// the empty string; a later duplicate key wins.
fn parse_query_string(s: &str) -> HashMap<String, String> {
    let query = match s.find('?') {
        Some(idx) => &s[idx + 1..],
        None => s,
    };

    let mut params = HashMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((key, value)) => params.insert(key.to_string(), value.to_string()),
            None => params.insert(pair.to_string(), String::new()),
        };
    }
    params
}
