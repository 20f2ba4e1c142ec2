//! BibTeX low-level parsing implementation.
//!
//! A hand-rolled, brace-aware scanner. Values keep their interior bracing
//! verbatim; only the outer delimiters (braces or quotes) are stripped, and
//! whitespace runs are collapsed to single spaces.

use crate::CitationError;

type Result<T> = std::result::Result<T, CitationError>;

/// One entry as it appears in the file, fields in source order.
#[derive(Debug, Clone)]
pub(crate) struct RawBibEntry {
    pub entry_type: String,
    pub key: String,
    pub fields: Vec<(String, String)>,
}

/// Parse the content of a BibTeX file, returning structured raw entries.
///
/// Text outside `@`-blocks is commentary and is ignored. `@comment`,
/// `@preamble`, and `@string` blocks are skipped without interpretation.
pub(crate) fn bibtex_parse(input: &str) -> Result<Vec<RawBibEntry>> {
    let mut cursor = Cursor::new(input);
    let mut entries = Vec::new();

    while let Some(c) = cursor.bump() {
        if c == '@'
            && let Some(entry) = parse_block(&mut cursor)?
        {
            entries.push(entry);
        }
    }

    Ok(entries)
}

fn parse_block(cursor: &mut Cursor) -> Result<Option<RawBibEntry>> {
    let entry_type = cursor
        .take_while(|c| c.is_ascii_alphabetic())
        .to_lowercase();
    if entry_type.is_empty() {
        return Err(cursor.error("expected entry type after '@'"));
    }

    cursor.skip_whitespace();
    let close = match cursor.bump() {
        Some('{') => '}',
        Some('(') => ')',
        _ => return Err(cursor.error("expected '{' or '(' after entry type")),
    };

    // Non-entry blocks carry no fields we care about.
    if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
        skip_balanced(cursor, close)?;
        return Ok(None);
    }

    cursor.skip_whitespace();
    let key = cursor
        .take_while(|c| !c.is_whitespace() && c != ',' && c != close)
        .to_string();
    if key.is_empty() {
        return Err(cursor.error("missing citation key"));
    }

    cursor.skip_whitespace();
    let mut fields = Vec::new();
    match cursor.bump() {
        Some(',') => parse_fields(cursor, close, &mut fields)?,
        Some(c) if c == close => {}
        _ => return Err(cursor.error("expected ',' or closing delimiter after citation key")),
    }

    Ok(Some(RawBibEntry {
        entry_type,
        key,
        fields,
    }))
}

fn parse_fields(
    cursor: &mut Cursor,
    close: char,
    fields: &mut Vec<(String, String)>,
) -> Result<()> {
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some(c) if c == close => {
                cursor.bump();
                return Ok(());
            }
            None => return Err(cursor.error("unterminated entry")),
            _ => {}
        }

        let name = cursor
            .take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            .to_lowercase();
        if name.is_empty() {
            return Err(cursor.error("expected field name"));
        }

        cursor.skip_whitespace();
        if cursor.bump() != Some('=') {
            return Err(cursor.error("expected '=' after field name"));
        }

        let value = parse_value(cursor, close)?;
        fields.push((name, value));

        cursor.skip_whitespace();
        match cursor.peek() {
            Some(',') => {
                cursor.bump();
            }
            Some(c) if c == close => {
                cursor.bump();
                return Ok(());
            }
            None => return Err(cursor.error("unterminated entry")),
            _ => return Err(cursor.error("expected ',' or closing delimiter after field value")),
        }
    }
}

/// Parses one field value: a braced block, a quoted string, or a bare
/// word/number, possibly `#`-concatenated. String macros are not expanded.
fn parse_value(cursor: &mut Cursor, close: char) -> Result<String> {
    let mut value = String::new();
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('{') => {
                cursor.bump();
                braced_into(cursor, &mut value)?;
            }
            Some('"') => {
                cursor.bump();
                quoted_into(cursor, &mut value)?;
            }
            Some(_) => {
                let bare = cursor
                    .take_while(|c| !c.is_whitespace() && c != ',' && c != '#' && c != close);
                value.push_str(bare);
            }
            None => return Err(cursor.error("unterminated field value")),
        }

        cursor.skip_whitespace();
        if cursor.peek() == Some('#') {
            cursor.bump();
        } else {
            break;
        }
    }
    Ok(collapse_whitespace(&value))
}

/// Consumes a `{...}` block (opening brace already consumed), appending its
/// interior verbatim, nested braces included.
fn braced_into(cursor: &mut Cursor, value: &mut String) -> Result<()> {
    let mut depth = 1usize;
    while let Some(c) = cursor.bump() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
        value.push(c);
    }
    Err(cursor.error("unbalanced braces in field value"))
}

/// Consumes a `"..."` value (opening quote already consumed). A quote inside
/// a braced sub-group does not terminate the value.
fn quoted_into(cursor: &mut Cursor, value: &mut String) -> Result<()> {
    let mut depth = 0usize;
    while let Some(c) = cursor.bump() {
        match c {
            '"' if depth == 0 => return Ok(()),
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        value.push(c);
    }
    Err(cursor.error("unterminated quoted value"))
}

/// Skips the remainder of a block whose opening delimiter was consumed,
/// honoring nesting of that delimiter pair.
fn skip_balanced(cursor: &mut Cursor, close: char) -> Result<()> {
    let open = if close == '}' { '{' } else { '(' };
    let mut depth = 1usize;
    while let Some(c) = cursor.bump() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Ok(());
            }
        }
    }
    Err(cursor.error("unterminated block"))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A forward-only scanner with line tracking for error reporting.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn error(&self, message: &str) -> CitationError {
        CitationError::MalformedInput {
            message: message.to_string(),
            line: self.line,
        }
    }
}
