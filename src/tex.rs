//! Citation scanning and rewriting in LaTeX sources.
//!
//! A citation reference is a `\cite`-family command followed by a braced,
//! possibly comma-separated list of citation keys, e.g.
//! `\cite{smith2019,jones2021}`. Keys are matched as whole tokens: counting
//! or rewriting `keyB` never touches `keyB2`.
//!
//! Documents are read fully into memory per operation and rewritten in full;
//! rewrites go through a temporary file in the same directory and an atomic
//! rename, so a crash never leaves a truncated source behind.

use crate::regex::{Captures, Regex, escape};
use crate::{DuplicateGroup, Result};
use itertools::Itertools;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The `\cite`-family commands recognized as citation references, including
/// the common natbib variants.
const CITE_COMMANDS: &str = r"cite|citep|citet|citealp|citealt|citeauthor";

/// Compiles a pattern matching a citation construct containing `key` as a
/// whole token somewhere in its key list.
fn cite_pattern(key: &str) -> Regex {
    let pattern = format!(
        r"(\\(?:{CITE_COMMANDS})\*?\{{[^}}]*\b){}(\b[^}}]*\}})",
        escape(key)
    );
    Regex::new(&pattern).expect("citation pattern is valid")
}

/// Counts citation constructs in `text` that reference `key`.
pub fn count_citations_in(text: &str, key: &str) -> usize {
    cite_pattern(key).find_iter(text).count()
}

/// Replaces `old` with `new` inside every citation construct in `text`,
/// leaving all other tokens and surrounding text verbatim.
pub fn replace_citations_in(text: &str, old: &str, new: &str) -> String {
    cite_pattern(old)
        .replace_all(text, |caps: &Captures| {
            format!("{}{}{}", &caps[1], new, &caps[2])
        })
        .into_owned()
}

/// Counts citations of `key` summed across all `documents`.
///
/// # Errors
///
/// Fails if any document cannot be read; file access failures are fatal to
/// the run.
pub fn count_citations(documents: &[PathBuf], key: &str) -> Result<usize> {
    let mut total = 0;
    for path in documents {
        total += count_citations_in(&fs::read_to_string(path)?, key);
    }
    Ok(total)
}

/// Checks whether `key` is cited anywhere in the corpus.
pub fn is_cited(documents: &[PathBuf], key: &str) -> Result<bool> {
    for path in documents {
        if count_citations_in(&fs::read_to_string(path)?, key) > 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Keeps only groups worth unifying and annotates their members with
/// occurrence counts.
///
/// A group survives when at least one member's key is cited more than once
/// across the corpus; if every key appears at most once there is no repeated
/// usage to consolidate. Every member of a surviving group gets its
/// `occurrences` count attached.
pub fn filter_cited_groups(
    groups: Vec<DuplicateGroup>,
    documents: &[PathBuf],
) -> Result<Vec<DuplicateGroup>> {
    let mut kept = Vec::new();
    for mut group in groups {
        let keys: Vec<String> = group.keys().unique().map(String::from).collect();
        let mut counts: HashMap<String, usize> = HashMap::with_capacity(keys.len());
        for key in keys {
            let count = count_citations(documents, &key)?;
            counts.insert(key, count);
        }

        if counts.values().any(|&count| count > 1) {
            for entry in &mut group.members {
                entry.occurrences = counts.get(&entry.key).copied().unwrap_or(0);
            }
            kept.push(group);
        } else {
            log::debug!("dropping group '{}': no key cited more than once", group.title);
        }
    }
    Ok(kept)
}

/// Replaces `old` with `new` in every citation construct of one document and
/// writes the result back in place.
///
/// Returns the number of citation constructs rewritten. The write is
/// atomic: content goes to a temporary file next to the original, then the
/// temporary is renamed over it.
pub fn replace_key_in_file(path: &Path, old: &str, new: &str) -> Result<usize> {
    let content = fs::read_to_string(path)?;
    let replaced = count_citations_in(&content, old);
    if replaced > 0 {
        let new_content = replace_citations_in(&content, old, new);
        write_atomically(path, &new_content)?;
    }
    Ok(replaced)
}

/// Applies a unification to the whole corpus: each key in `old_keys` is
/// rewritten to `new_key`, sequentially, in every document.
pub fn replace_keys(documents: &[PathBuf], old_keys: &[String], new_key: &str) -> Result<()> {
    for old in old_keys {
        for path in documents {
            let replaced = replace_key_in_file(path, old, new_key)?;
            log::info!(
                "replaced {} occurrence(s) of '{}' with '{}' in {}",
                replaced,
                old,
                new_key,
                path.display()
            );
        }
    }
    Ok(())
}

fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entry;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn entry(key: &str, title: &str) -> Entry {
        Entry {
            key: key.to_string(),
            entry_type: "article".to_string(),
            fields: HashMap::from([("title".to_string(), title.to_string())]),
            occurrences: 0,
        }
    }

    fn group(title: &str, keys: &[&str]) -> DuplicateGroup {
        DuplicateGroup {
            title: title.to_string(),
            members: keys.iter().map(|k| entry(k, title)).collect(),
        }
    }

    fn write_doc(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[rstest]
    #[case(r"\cite{keyA}", "keyA", 1)]
    #[case(r"\cite{keyA} and \cite{keyA,keyB}", "keyA", 2)]
    #[case(r"\cite{keyB2}", "keyB", 0)]
    #[case(r"\cite{other,keyB,third}", "keyB", 1)]
    #[case(r"\citep{keyA} \citet{keyA} \citeauthor{keyA}", "keyA", 3)]
    #[case(r"\citet*{keyA}", "keyA", 1)]
    #[case(r"keyA outside any citation", "keyA", 0)]
    #[case(r"\cite{prefixkeyA}", "keyA", 0)]
    fn test_count_citations_in(#[case] text: &str, #[case] key: &str, #[case] expected: usize) {
        assert_eq!(count_citations_in(text, key), expected);
    }

    #[test]
    fn test_replace_preserves_other_tokens() {
        let text = r"Intro \cite{other,keyB,third} and \cite{keyB}.";
        let replaced = replace_citations_in(text, "keyB", "keyA");
        assert_eq!(replaced, r"Intro \cite{other,keyA,third} and \cite{keyA}.");
    }

    #[test]
    fn test_replace_is_word_boundary_safe() {
        let text = r"\cite{keyB} \cite{keyB2} \cite{keyB,keyB2}";
        let replaced = replace_citations_in(text, "keyB", "keyA");
        assert_eq!(replaced, r"\cite{keyA} \cite{keyB2} \cite{keyA,keyB2}");
    }

    #[test]
    fn test_replace_handles_regex_metacharacters_in_keys() {
        let text = r"\cite{key.B}";
        assert_eq!(count_citations_in(text, "key.B"), 1);
        // The dot must not act as a wildcard.
        assert_eq!(count_citations_in(r"\cite{keyXB}", "key.B"), 0);
        let replaced = replace_citations_in(text, "key.B", "keyA");
        assert_eq!(replaced, r"\cite{keyA}");
    }

    #[test]
    fn test_count_citations_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_doc(&dir, "a.tex", r"\cite{keyA} text \cite{keyA,keyB}");
        let b = write_doc(&dir, "b.tex", r"\citep{keyA}");
        let documents = vec![a, b];

        assert_eq!(count_citations(&documents, "keyA").unwrap(), 3);
        assert_eq!(count_citations(&documents, "keyB").unwrap(), 1);
        assert!(is_cited(&documents, "keyB").unwrap());
        assert!(!is_cited(&documents, "keyC").unwrap());
    }

    #[test]
    fn test_filter_discards_groups_without_repeated_usage() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(&dir, "main.tex", r"\cite{keyA} \cite{keyB}");
        let documents = vec![doc];

        // Both keys cited exactly once: nothing recurs, nothing to unify.
        let kept =
            filter_cited_groups(vec![group("T", &["keyA", "keyB"])], &documents).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_filter_keeps_groups_with_a_repeated_key() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(&dir, "main.tex", r"\cite{keyA} \cite{keyA}");
        let documents = vec![doc];

        let kept =
            filter_cited_groups(vec![group("T", &["keyA", "keyB"])], &documents).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].members[0].occurrences, 2);
        assert_eq!(kept[0].members[1].occurrences, 0);
    }

    #[test]
    fn test_replace_keys_rewrites_files_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(
            &dir,
            "main.tex",
            r"\cite{keyA} then \cite{keyB} and \cite{keyB,keyC}",
        );
        let documents = vec![doc.clone()];

        replace_keys(&documents, &["keyB".to_string(), "keyC".to_string()], "keyA").unwrap();
        assert_eq!(
            fs::read_to_string(&doc).unwrap(),
            r"\cite{keyA} then \cite{keyA} and \cite{keyA,keyA}"
        );
    }

    #[test]
    fn test_untouched_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(&dir, "main.tex", "no citations here");
        assert_eq!(replace_key_in_file(&doc, "keyA", "keyB").unwrap(), 0);
        assert_eq!(fs::read_to_string(&doc).unwrap(), "no citations here");
    }
}
