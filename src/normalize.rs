//! Title normalization for duplicate detection.
//!
//! BibTeX titles frequently differ only in protective bracing
//! (`{{Heisenberg}}` vs `Heisenberg`), punctuation, hyphenation, or case.
//! Comparison happens on a normalized form: double braces resolved to their
//! inner content, hyphens treated as word breaks, remaining punctuation
//! stripped, lowercased, and split into words.

use crate::regex::Regex;
use std::sync::LazyLock;

static DOUBLE_BRACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]*)\}\}").unwrap());

/// Replaces every substring wrapped in doubled braces `{{X}}` with `X`.
///
/// Only a single innermost level is handled, non-greedily; malformed brace
/// nesting is passed through unchanged. Any braces that survive are removed
/// by the punctuation strip in [`normalize_title`].
pub fn strip_double_braces(title: &str) -> String {
    DOUBLE_BRACE_REGEX.replace_all(title, "$1").into_owned()
}

/// Normalizes a raw title into an ordered sequence of comparison words.
///
/// Double-brace wrapping is resolved first. Hyphens and dashes become word
/// breaks, so `heavy-fermion` and `heavy fermion` normalize to the same
/// words. Every other ASCII punctuation character is dropped, the result is
/// lowercased and split on whitespace. An empty title yields an empty
/// sequence; the function never fails.
///
/// # Examples
///
/// ```
/// use citedupe::normalize::normalize_title;
///
/// assert_eq!(
///     normalize_title("{{Quantum}} Hall Effect!"),
///     vec!["quantum", "hall", "effect"]
/// );
/// ```
pub fn normalize_title(title: &str) -> Vec<String> {
    strip_double_braces(title)
        .chars()
        .map(|c| if c == '-' || c == '\u{2013}' || c == '\u{2014}' { ' ' } else { c })
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect()
}
