//! A library for finding duplicate BibTeX entries and unifying their citation
//! keys across LaTeX sources.
//!
//! `citedupe` detects bibliography entries whose titles are likely the same
//! publication despite differing punctuation, bracing, or near-identical
//! wording, and rewrites citation keys throughout the LaTeX documents so that
//! every occurrence points at one canonical entry.
//!
//! # Key Features
//!
//! - **Title-based duplicate grouping**: titles are normalized (double-brace
//!   artifacts resolved, punctuation stripped, lowercased) and entries are
//!   grouped when their titles share an ordered word subsequence above a
//!   configurable window length.
//! - **Adaptive refinement**: groups that are too large to review, or that a
//!   reviewer rejects, are re-partitioned at successively stricter thresholds
//!   until they split or stop shrinking.
//! - **Usage-aware filtering**: only groups whose keys are actually cited
//!   repeatedly in the document corpus are surfaced.
//! - **Safe key rewriting**: `\cite{...}` key lists are rewritten with
//!   whole-token matching and atomic file replacement.
//!
//! # Basic Usage
//!
//! ```rust
//! use citedupe::{BibTexParser, EntryParser};
//! use citedupe::dedupe::{Deduplicator, DeduplicatorConfig};
//!
//! let input = r#"@article{ginzburg1950,
//!     title = {On the Theory of Superconductivity and Phase Transitions},
//! }
//! @article{ginzburg_reprint,
//!     title = {{{On}} the theory of superconductivity and phase transitions, revisited},
//! }"#;
//!
//! let entries = BibTexParser::new().parse(input).unwrap();
//! let deduplicator = Deduplicator::new().with_config(DeduplicatorConfig { min_overlap: 5 });
//! let groups = deduplicator.find_potential_duplicates(&entries);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].members.len(), 2);
//! ```
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type that wraps [`CitationError`] for
//! consistent error handling across all operations. The grouping and matching
//! algorithms themselves are total functions and never fail; errors come from
//! parsing and file access only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod bibtex;
pub mod dedupe;
pub mod normalize;
pub mod refine;
mod regex;
pub mod tex;

// Reexports
pub use bibtex::BibTexParser;

/// A specialized Result type for citation operations.
pub type Result<T> = std::result::Result<T, CitationError>;

/// Represents errors that can occur while parsing bibliographies or
/// rewriting documents.
#[derive(Error, Debug)]
pub enum CitationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Malformed input: {message} at line {line}")]
    MalformedInput { message: String, line: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A single bibliography entry: a citation key plus a mapping from field
/// names to their text content.
///
/// Field names are lowercased by the parser. `occurrences` is a derived
/// attribute attached by the usage filter (see [`tex::filter_cited_groups`])
/// and is zero until then.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The citation key used to reference this entry from LaTeX sources.
    pub key: String,
    /// The entry type (`article`, `book`, ...), lowercased.
    pub entry_type: String,
    /// Entry fields keyed by lowercased field name.
    pub fields: HashMap<String, String>,
    /// How often the key is cited across the document corpus.
    pub occurrences: usize,
}

impl Entry {
    /// Returns the raw (unnormalized) title, or `None` if the entry has no
    /// title field.
    ///
    /// Lookup is case-insensitive so entries built by hand with a `Title`
    /// field behave the same as parsed ones.
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").map(String::as_str).or_else(|| {
            self.fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("title"))
                .map(|(_, value)| value.as_str())
        })
    }

    /// Returns the named field, looked up by lowercased name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// A group of entries whose titles likely describe the same publication.
///
/// `members[0]` is the anchor: every other member's normalized title
/// contains, as an ordered subsequence, a contiguous window of the anchor's
/// normalized title. Members are not necessarily mutually similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The literal title of the anchor entry, for display.
    pub title: String,
    /// The entries in the group, anchor first, in encounter order.
    pub members: Vec<Entry>,
}

impl DuplicateGroup {
    /// Citation keys of all members, in group order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|entry| entry.key.as_str())
    }
}

/// A confirmed unification: one key to keep and the keys to rewrite into it.
///
/// Produced only after explicit reviewer confirmation; consumed by
/// [`tex::replace_keys`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnificationDecision {
    /// The citation key all members are unified under.
    pub keep: String,
    /// The keys to be replaced by `keep`.
    pub discard: Vec<String>,
}

/// Trait for implementing bibliography parsers.
pub trait EntryParser {
    /// Parse a string containing one or more bibliography entries.
    ///
    /// # Errors
    ///
    /// Returns `CitationError` if the input is malformed.
    fn parse(&self, input: &str) -> Result<Vec<Entry>>;
}
