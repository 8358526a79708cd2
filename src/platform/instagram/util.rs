use std::sync::LazyLock;

use regex::Regex;

use super::model::Shortcode;

static INSTAGRAM_POST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"instagram\.com/p/([A-Za-z0-9_-]+)").expect("post regex is valid"));

/// Pulls the post shortcode out of anything that contains `instagram.com/p/<code>`.
///
/// This is a substring search, so schemes, `www.`, trailing slashes and query
/// strings around the code are all tolerated.
pub fn parse_shortcode(url: &str) -> Option<Shortcode> {
    INSTAGRAM_POST_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| Shortcode(m.as_str().to_string()))
}
