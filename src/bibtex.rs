//! BibTeX format parser implementation.
//!
//! Parses `.bib` databases into [`Entry`] values: an entry type, a citation
//! key, and a mapping from lowercased field names to verbatim field content.
//! Outer value delimiters (braces or quotes) are stripped; interior bracing
//! such as `{{Quantum}}` is preserved for the title normalizer to resolve.
//!
//! # Example
//!
//! ```
//! use citedupe::{BibTexParser, EntryParser};
//!
//! let input = r#"@article{smith2019,
//!     title = {An Example Title},
//!     author = {Smith, John},
//!     year = 2019,
//! }"#;
//!
//! let entries = BibTexParser::new().parse(input).unwrap();
//! assert_eq!(entries[0].key, "smith2019");
//! assert_eq!(entries[0].title(), Some("An Example Title"));
//! ```

mod parse;

use crate::{Entry, EntryParser, Result};
use parse::bibtex_parse;
use std::fs;
use std::path::PathBuf;

/// Parser for BibTeX bibliography databases.
///
/// `@comment`, `@preamble`, and `@string` blocks are skipped; string macro
/// expansion is not performed, so a bare `month = jan` value is carried
/// through as the macro name.
#[derive(Debug, Clone, Default)]
pub struct BibTexParser;

impl BibTexParser {
    /// Creates a new BibTeX parser instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryParser for BibTexParser {
    /// Parses a string containing one or more BibTeX entries.
    ///
    /// # Errors
    ///
    /// Returns `CitationError::MalformedInput` for unbalanced braces or a
    /// truncated entry; text between entries is ignored, as BibTeX treats it
    /// as commentary.
    fn parse(&self, input: &str) -> Result<Vec<Entry>> {
        let raw_entries = bibtex_parse(input)?;

        let mut entries = Vec::with_capacity(raw_entries.len());
        for raw in raw_entries {
            entries.push(Entry {
                key: raw.key,
                entry_type: raw.entry_type,
                fields: raw.fields.into_iter().collect(),
                occurrences: 0,
            });
        }

        Ok(entries)
    }
}

/// Reads and parses a list of `.bib` files into one entry sequence.
///
/// # Errors
///
/// Fails on the first unreadable or malformed file; file access failures
/// are fatal to the run.
pub fn read_bibtex_files(paths: &[PathBuf]) -> Result<Vec<Entry>> {
    let parser = BibTexParser::new();
    let mut entries = Vec::new();
    for path in paths {
        let content = fs::read_to_string(path)?;
        entries.extend(parser.parse(&content)?);
    }
    Ok(entries)
}
