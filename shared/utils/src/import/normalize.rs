//! Column-name normalization.
//!
//! Source headers arrive with unit annotations and stray spacing, e.g.
//! `연간기술이전수입액 (억)`. Every header and every configured column name is
//! passed through [`normalize_column`] before comparison.

use regex::Regex;
use std::sync::OnceLock;

fn parenthetical() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical pattern"))
}

/// Remove parenthesized segments, then every whitespace character.
pub fn normalize_column(name: &str) -> String {
    parenthetical()
        .replace_all(name, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
