//! Utility functions and helpers.

pub mod http;

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn strip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static pattern"))
}

fn collapse_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").expect("static pattern"))
}

/// Turn arbitrary text into a filesystem-safe slug.
///
/// Transliterates to ASCII, lowercases, removes everything outside
/// alphanumerics/underscores/hyphens/whitespace, collapses whitespace and
/// hyphen runs into single hyphens, and trims leading/trailing hyphens and
/// underscores. Stable across repeated calls for identical input.
pub fn slugify(value: &str) -> String {
    let ascii = deunicode::deunicode(value).to_lowercase();
    let cleaned = strip_pattern().replace_all(&ascii, "");
    let collapsed = collapse_pattern().replace_all(&cleaned, "-");
    collapsed
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}
