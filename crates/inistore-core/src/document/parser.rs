//! Recovering, line-oriented INI parser.
//!
//! Input format:
//! ```text
//! [section name]
//! key = value
//! other key = value = with = equals
//! empty =
//! ```
//!
//! The parser is a three-state machine (see [`State`]).  Malformed lines never
//! abort the parse: each one produces a [`ParseDiagnostic`] and is skipped up
//! to and including its newline.  [`parse`] also logs every diagnostic through
//! `tracing`; [`scan`] leaves reporting to the caller.  Whatever was
//! well formed ends up in the returned [`Document`].
//!
//! Blanks are space, tab and carriage return; treating `\r` as a blank makes
//! CRLF files parse exactly like LF files.

use thiserror::Error;
use tracing::error;

use crate::document::model::Document;

/// What went wrong on a skipped line.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Content appeared before any `[section]` header (or after a bad one).
    #[error("expected begin of section")]
    ExpectedSectionBegin,

    /// The line ended before the closing `]`.
    #[error("end of line within section header")]
    UnterminatedHeaderAtEol,

    /// The buffer ended before the closing `]`.
    #[error("end of file within section header")]
    UnterminatedHeaderAtEof,

    /// `[]` or `[   ]`.
    #[error("empty section name")]
    EmptySectionName,

    /// Something other than blanks follows the closing `]`.
    #[error("got junk after section header")]
    JunkAfterSectionHeader,

    /// A line inside a section has no `=`.
    #[error("expected assignment")]
    ExpectedAssignment,

    /// `= value` with nothing before the `=`.
    #[error("expected key name")]
    ExpectedKeyName,
}

/// A recoverable error found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// 1-based line on which the offending construct began.
    pub line: usize,
    /// Kind of error.
    pub kind: ParseErrorKind,
}

/// Result of a parse: the document plus every recovered error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub document: Document,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParseOutcome {
    /// Returns `true` if no line had to be skipped.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Parses `text` into a document, logging malformed lines against
/// `source_name`.
///
/// # Examples
///
/// ```rust
/// use inistore_core::document::parser::parse;
///
/// let outcome = parse("inline", "[global]\nkey = value");
/// let global = outcome.document.section("global").unwrap();
/// assert_eq!(global.get("key"), Some("value"));
/// assert!(outcome.is_clean());
/// ```
pub fn parse(source_name: &str, text: &str) -> ParseOutcome {
    let outcome = scan(text);
    for diagnostic in &outcome.diagnostics {
        error!(source = source_name, line = diagnostic.line, "{}", diagnostic.kind);
    }
    outcome
}

/// Parses `text` like [`parse`] without logging the diagnostics.
pub fn scan(text: &str) -> ParseOutcome {
    Parser::new(text).run()
}

/// Parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectSectionBegin,
    ExpectSectionName,
    /// Inside a section; holds the section's index in the document.
    ExpectAssignment(usize),
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    outcome: ParseOutcome,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
            outcome: ParseOutcome::default(),
        }
    }

    fn run(mut self) -> ParseOutcome {
        let mut state = State::ExpectSectionBegin;
        loop {
            state = match state {
                State::ExpectSectionBegin => match self.section_begin() {
                    Some(next) => next,
                    None => break,
                },
                State::ExpectSectionName => self.section_name(),
                State::ExpectAssignment(section) => match self.assignment(section) {
                    Some(next) => next,
                    None => break,
                },
            };
        }
        self.outcome
    }

    /// Handles one line (or the `[` of a header) in `ExpectSectionBegin`.
    /// Returns `None` at end of input.
    fn section_begin(&mut self) -> Option<State> {
        self.skip_blanks();
        match self.peek()? {
            b'\n' => {
                self.consume_newline();
                Some(State::ExpectSectionBegin)
            }
            b'[' => {
                self.pos += 1;
                Some(State::ExpectSectionName)
            }
            _ => {
                self.report(self.line, ParseErrorKind::ExpectedSectionBegin);
                self.skip_line();
                Some(State::ExpectSectionBegin)
            }
        }
    }

    /// Scans the header name after `[`.  Never hits end of input silently:
    /// an unterminated header is reported and the state machine resumes in
    /// `ExpectSectionBegin`, which then observes the end of input.
    fn section_name(&mut self) -> State {
        let line = self.line;
        let start = self.pos;
        let end = self.scan_until(b']');

        match self.peek() {
            Some(b']') => {}
            Some(_) => {
                self.report(line, ParseErrorKind::UnterminatedHeaderAtEol);
                self.skip_line();
                return State::ExpectSectionBegin;
            }
            None => {
                self.report(line, ParseErrorKind::UnterminatedHeaderAtEof);
                return State::ExpectSectionBegin;
            }
        }

        let text = self.text;
        let name = &text[start..trim_end(self.bytes, start, end)];
        // consume ']'
        self.pos += 1;

        if name.is_empty() {
            self.report(line, ParseErrorKind::EmptySectionName);
            self.skip_line();
            return State::ExpectSectionBegin;
        }

        self.skip_blanks();
        match self.peek() {
            None => {}
            Some(b'\n') => self.consume_newline(),
            Some(_) => {
                self.report(line, ParseErrorKind::JunkAfterSectionHeader);
                self.skip_line();
                return State::ExpectSectionBegin;
            }
        }

        let index = self.outcome.document.section_index_or_insert(name);
        State::ExpectAssignment(index)
    }

    /// Handles one line in `ExpectAssignment`.  Returns `None` at end of
    /// input.
    fn assignment(&mut self, section: usize) -> Option<State> {
        self.skip_blanks();
        match self.peek()? {
            b'\n' => {
                self.consume_newline();
                return Some(State::ExpectAssignment(section));
            }
            // Re-processed by ExpectSectionBegin.
            b'[' => return Some(State::ExpectSectionBegin),
            _ => {}
        }

        let line = self.line;
        let key_start = self.pos;
        let key_scan_end = self.scan_until(b'=');
        if self.peek() != Some(b'=') {
            self.report(line, ParseErrorKind::ExpectedAssignment);
            self.skip_line();
            return Some(State::ExpectAssignment(section));
        }

        let key_end = trim_end(self.bytes, key_start, key_scan_end);
        if key_end == key_start {
            self.report(line, ParseErrorKind::ExpectedKeyName);
            self.skip_line();
            return Some(State::ExpectAssignment(section));
        }
        let text = self.text;
        let key = &text[key_start..key_end];

        // consume '='
        self.pos += 1;
        self.skip_blanks();
        let value_start = self.pos;
        let value_scan_end = self.scan_until(b'\n');
        let value = &text[value_start..trim_end(self.bytes, value_start, value_scan_end)];

        self.outcome
            .document
            .section_at_mut(section)
            .set(key, value);

        if self.peek() == Some(b'\n') {
            self.consume_newline();
        }
        Some(State::ExpectAssignment(section))
    }

    // ── Cursor helpers ────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_blanks(&mut self) {
        while self.peek().is_some_and(is_blank) {
            self.pos += 1;
        }
    }

    /// Advances to the first occurrence of `delimiter` or newline (or end of
    /// input), without consuming it.  Returns the stop position.
    fn scan_until(&mut self, delimiter: u8) -> usize {
        while let Some(byte) = self.peek() {
            if byte == delimiter || byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
        self.pos
    }

    fn consume_newline(&mut self) {
        debug_assert_eq!(self.peek(), Some(b'\n'));
        self.pos += 1;
        self.line += 1;
    }

    /// Consumes everything up to and including the next newline.
    fn skip_line(&mut self) {
        self.scan_until(b'\n');
        if self.peek() == Some(b'\n') {
            self.consume_newline();
        }
    }

    fn report(&mut self, line: usize, kind: ParseErrorKind) {
        self.outcome.diagnostics.push(ParseDiagnostic { line, kind });
    }
}

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r')
}

/// Scans backward from `end` over blanks, never past `start`.
///
/// All delimiters are ASCII, so the returned index is always a UTF-8 char
/// boundary.
fn trim_end(bytes: &[u8], start: usize, mut end: usize) -> usize {
    while end > start && is_blank(bytes[end - 1]) {
        end -= 1;
    }
    end
}

// ── Tests ─────────────────────────────────────────────────────────────────────
