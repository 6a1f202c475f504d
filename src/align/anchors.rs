use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static NUMERIC_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3,}").expect("valid anchor regex"));

/// Runs of three or more digits found in `text`. Order numbers, prices and
/// counts are distinctive enough to fingerprint a component's content.
pub fn numeric_anchors(text: &str) -> BTreeSet<String> {
    NUMERIC_ANCHOR
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn shares_anchor(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.intersection(b).next().is_some()
}
