use std::sync::OnceLock;

use regex::Regex;

static NON_TOKEN: OnceLock<Regex> = OnceLock::new();

/// Canonicalizes a column label into a comparable token.
///
/// Lowercases, turns every run of characters outside `[a-z0-9]` into a single
/// `_`, and drops underscores at either end. Only used for comparison; the
/// displayed header is never altered.
pub fn normalize_header(header: &str) -> String {
    let pattern = NON_TOKEN.get_or_init(|| Regex::new("[^a-z0-9]+").expect("static pattern"));
    let lowered = header.to_lowercase();
    pattern
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}
