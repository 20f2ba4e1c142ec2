//! Duplicate-entry grouping implementation.
//!
//! A module for detecting bibliography entries that likely describe the same
//! publication. Entries are grouped when their normalized titles share an
//! ordered word subsequence: a contiguous window of the anchor's title, at
//! least `min_overlap` words long, that appears in order (not necessarily
//! contiguously) in the candidate's title.
//!
//! ## Usage
//!
//! ```rust
//! use citedupe::Entry;
//! use citedupe::dedupe::Deduplicator;
//! use std::collections::HashMap;
//!
//! let entry = |key: &str, title: &str| Entry {
//!     key: key.to_string(),
//!     entry_type: "article".to_string(),
//!     fields: HashMap::from([("title".to_string(), title.to_string())]),
//!     occurrences: 0,
//! };
//!
//! let entries = vec![
//!     entry("a", "Scaling Theory of Localization in Disordered Systems"),
//!     entry("b", "Scaling theory of localization in disordered systems: a review"),
//!     entry("c", "Completely Unrelated Work"),
//! ];
//!
//! let groups = Deduplicator::new().find_potential_duplicates(&entries);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].members.len(), 2);
//! ```
//!
//! ## Matching Criteria
//!
//! For an anchor entry `i` and a later entry `j`, a window of exactly
//! `min_overlap` consecutive words slides across `i`'s normalized title; the
//! first window that is an ordered subsequence of `j`'s normalized title adds
//! `j` to `i`'s group. The asymmetry is deliberate: it tolerates `j`'s title
//! being a superset or rephrasing of a span of `i`'s.

use crate::normalize::normalize_title;
use crate::{DuplicateGroup, Entry};
use std::collections::HashSet;

/// Default minimum shared-window length, in words.
pub const DEFAULT_MIN_OVERLAP: usize = 5;

/// Configuration options for controlling the grouping process.
///
/// # Examples
///
/// ```
/// use citedupe::dedupe::DeduplicatorConfig;
///
/// let config = DeduplicatorConfig { min_overlap: 7 };
/// ```
#[derive(Debug, Clone)]
pub struct DeduplicatorConfig {
    /// Minimum length, in words, of the contiguous title window two entries
    /// must share (as an ordered subsequence) to be considered duplicates.
    /// Values below 1 are treated as 1.
    pub min_overlap: usize,
}

impl Default for DeduplicatorConfig {
    fn default() -> Self {
        Self {
            min_overlap: DEFAULT_MIN_OVERLAP,
        }
    }
}

/// Core grouping engine for finding likely-duplicate entries.
///
/// Grouping is deterministic for a fixed input order: anchors are taken in
/// encounter order and each entry joins at most one group (an explicit
/// already-assigned set, checked by index). Raising `min_overlap` only ever
/// shrinks or preserves groups.
///
/// # Performance
///
/// Time complexity is O(n² · w²) in the worst case for n entries with
/// w-word titles; bibliographies are small enough that this is irrelevant in
/// practice.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    config: DeduplicatorConfig,
}

impl Deduplicator {
    /// Creates a new Deduplicator with the default window length.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new Deduplicator with custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use citedupe::dedupe::{Deduplicator, DeduplicatorConfig};
    ///
    /// let deduplicator = Deduplicator::new().with_config(DeduplicatorConfig { min_overlap: 6 });
    /// ```
    #[must_use]
    pub fn with_config(mut self, config: DeduplicatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Groups entries whose titles likely describe the same publication.
    ///
    /// Returns groups in encounter order, each keyed by the literal title of
    /// its anchor (first-seen) entry. Groups with a single member are
    /// discarded. Entries without a title, or with fewer normalized words
    /// than `min_overlap`, produce no windows and can only ever join a group
    /// anchored by an earlier entry.
    ///
    /// This is a total function: malformed titles normalize to whatever
    /// words survive and simply fail to match.
    pub fn find_potential_duplicates(&self, entries: &[Entry]) -> Vec<DuplicateGroup> {
        let min_overlap = self.config.min_overlap.max(1);

        let titles: Vec<Vec<String>> = entries
            .iter()
            .map(|entry| normalize_title(entry.title().unwrap_or_default()))
            .collect();

        let mut assigned: HashSet<usize> = HashSet::new();
        let mut groups = Vec::new();

        for i in 0..entries.len() {
            if assigned.contains(&i) {
                continue;
            }
            assigned.insert(i);

            let mut members = vec![entries[i].clone()];
            for j in (i + 1)..entries.len() {
                if assigned.contains(&j) {
                    continue;
                }
                if shares_window(&titles[i], &titles[j], min_overlap) {
                    members.push(entries[j].clone());
                    assigned.insert(j);
                }
            }

            if members.len() > 1 {
                log::debug!(
                    "grouped {} entries under '{}'",
                    members.len(),
                    entries[i].title().unwrap_or("<no title>")
                );
                groups.push(DuplicateGroup {
                    title: entries[i].title().unwrap_or_default().to_string(),
                    members,
                });
            }
        }

        groups
    }
}

/// Checks whether some window of exactly `min_overlap` consecutive words of
/// `anchor` is an ordered subsequence of `candidate`.
///
/// The first matching window wins; anchors shorter than `min_overlap` have
/// no windows and never match.
fn shares_window(anchor: &[String], candidate: &[String], min_overlap: usize) -> bool {
    anchor
        .windows(min_overlap)
        .any(|window| is_subsequence(window, candidate))
}

/// Checks whether `needle` is an ordered subsequence of `haystack`.
///
/// A single forward cursor advances over `haystack`; each needle word must
/// appear at or after the previous match. O(|needle| + |haystack|).
pub(crate) fn is_subsequence(needle: &[String], haystack: &[String]) -> bool {
    let mut haystack = haystack.iter();
    needle.iter().all(|word| haystack.any(|other| other == word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::collections::HashMap;

    fn entry(key: &str, title: &str) -> Entry {
        Entry {
            key: key.to_string(),
            entry_type: "article".to_string(),
            fields: HashMap::from([("title".to_string(), title.to_string())]),
            occurrences: 0,
        }
    }

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[rstest]
    #[case("a b", "x a y b", true)]
    #[case("b a", "a b", false)]
    #[case("", "a b", true)]
    #[case("a", "", false)]
    #[case("a a", "a b a", true)]
    #[case("a a", "a b", false)]
    fn test_is_subsequence(#[case] needle: &str, #[case] haystack: &str, #[case] expected: bool) {
        assert_eq!(is_subsequence(&words(needle), &words(haystack)), expected);
    }

    #[test]
    fn test_cursor_never_restarts() {
        // "a b" must not match "b a": after matching "a" the cursor is past
        // the only "b".
        assert!(!is_subsequence(&words("a b"), &words("b a")));
        assert!(is_subsequence(&words("a b"), &words("b a b")));
    }

    #[test]
    fn test_shares_window_requires_full_window() {
        let anchor = words("one two three four five six");
        let candidate = words("zero one two three four five extra");
        assert!(shares_window(&anchor, &candidate, 5));
        // No 6-word window of the anchor survives in the candidate.
        assert!(!shares_window(&anchor, &candidate, 6));
    }

    #[test]
    fn test_short_anchor_has_no_windows() {
        let anchor = words("too short");
        let candidate = words("too short but much longer than the anchor");
        assert!(!shares_window(&anchor, &candidate, 5));
    }

    #[test]
    fn test_groups_heavy_fermion_variants() {
        let entries = vec![
            entry("keyA", "Unconventional Superconductivity in Heavy Fermion Systems"),
            entry(
                "keyB",
                "Unconventional superconductivity in heavy-fermion systems: a review",
            ),
        ];

        let groups = Deduplicator::new().find_potential_duplicates(&entries);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].title,
            "Unconventional Superconductivity in Heavy Fermion Systems"
        );
        assert_eq!(groups[0].keys().collect::<Vec<_>>(), vec!["keyA", "keyB"]);
    }

    #[test]
    fn test_singleton_groups_are_discarded() {
        let entries = vec![
            entry("a", "Theory of Everything in Eleven Dimensions Explained"),
            entry("b", "A Completely Different Topic Altogether"),
        ];
        let groups = Deduplicator::new().find_potential_duplicates(&entries);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_grouping_is_deterministic_and_idempotent() {
        let entries = vec![
            entry("a", "Scaling Theory of Localization in Disordered Systems"),
            entry("b", "Scaling theory of localization in disordered systems revisited"),
            entry("c", "Scaling theory of localization in disordered electron systems"),
        ];

        let deduplicator = Deduplicator::new();
        let first = deduplicator.find_potential_duplicates(&entries);
        let second = deduplicator.find_potential_duplicates(&entries);
        assert_eq!(first.len(), second.len());
        assert_eq!(
            first[0].keys().collect::<Vec<_>>(),
            second[0].keys().collect::<Vec<_>>()
        );

        // Re-running on a surfaced group's members never merges further at
        // the same threshold: the group reproduces itself.
        let again = deduplicator.find_potential_duplicates(&first[0].members);
        assert_eq!(again.len(), 1);
        assert_eq!(
            again[0].keys().collect::<Vec<_>>(),
            first[0].keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_raising_min_overlap_only_shrinks_groups() {
        let entries = vec![
            entry("a", "Electron Transport in Two Dimensional Systems at Low Temperature"),
            entry("b", "Electron transport in two dimensional systems at low temperature: experiments"),
            entry("c", "Electron transport in two dimensional systems with disorder"),
        ];

        let loose = Deduplicator::new()
            .with_config(DeduplicatorConfig { min_overlap: 5 })
            .find_potential_duplicates(&entries);
        let strict = Deduplicator::new()
            .with_config(DeduplicatorConfig { min_overlap: 8 })
            .find_potential_duplicates(&entries);

        assert_eq!(loose.len(), 1);
        assert_eq!(loose[0].members.len(), 3);

        // At 8 words, only the first two titles still share a full window.
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].keys().collect::<Vec<_>>(), vec!["a", "b"]);

        // Every strict group is a subset of some loose group.
        for group in &strict {
            let keys: Vec<_> = group.keys().collect();
            assert!(loose.iter().any(|wider| {
                let wider_keys: HashSet<_> = wider.keys().collect();
                keys.iter().all(|k| wider_keys.contains(k))
            }));
        }
    }

    #[test]
    fn test_entry_without_title_never_matches() {
        let mut untitled = entry("x", "");
        untitled.fields.clear();
        let entries = vec![
            untitled,
            entry("a", "Some Reasonably Long Title About Condensed Matter"),
            entry("b", "Some reasonably long title about condensed matter physics"),
        ];
        let groups = Deduplicator::new().find_potential_duplicates(&entries);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_min_overlap_is_clamped() {
        let entries = vec![
            entry("a", "alpha beta"),
            entry("b", "gamma alpha delta"),
        ];
        let groups = Deduplicator::new()
            .with_config(DeduplicatorConfig { min_overlap: 0 })
            .find_potential_duplicates(&entries);
        // Clamped to 1: a single shared word suffices.
        assert_eq!(groups.len(), 1);
    }
}
