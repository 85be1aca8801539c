//! Parser for FTL sources.
//!
//! This module implements a hand-written recursive descent parser over a
//! character stream. FTL has no token grammar to speak of — significance of
//! a character depends on indentation and position within the line — so the
//! parser works directly on code points with multi-character lookahead.
//!
//! # Parser Architecture
//!
//! The parser is organized into several submodules:
//!
//! - `stream` - Character cursor with CRLF folding and lookahead
//! - `pattern` - Pattern parsing (inline and indented block patterns)
//! - `expr` - Placeables, expressions, call arguments, variants, literals
//!
//! This file holds the entry loop, comment/message/term/attribute parsing,
//! and the blank-space helpers shared by the submodules.
//!
//! # Example
//!
//! ```rust
//! use fluently::parser;
//!
//! let source = "hello = Hello, world!\n";
//! let (resource, errors) = parser::parse(source);
//! assert!(errors.is_empty());
//! assert_eq!(resource.body.len(), 1);
//! ```
//!
//! # Error Recovery
//!
//! Errors are non-fatal by default. When an entry fails to parse, the parser
//! records the error, scans forward to the next line that can begin an entry
//! (a line starting with a letter, `#` or `-`), and emits a [`ast::Junk`]
//! node covering the skipped region. One malformed entry never destroys the
//! rest of the document.

mod expr;
mod pattern;
mod stream;


use crate::ast;
use crate::span::Span;
use stream::Stream;
use thiserror::Error;
use tracing::debug;

/// Line endings are normalized to this character by the stream.
pub(crate) const EOL: char = '\n';

/// An error raised by the parser, covering a single botched entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParserError {
    /// The source region the error refers to, in code-point positions.
    pub span: Span,
    pub message: String,
}

impl ParserError {
    pub(crate) fn new(start: usize, end: usize, message: impl Into<String>) -> Self {
        Self {
            span: Span::new(start, end),
            message: message.into(),
        }
    }
}

/// Parse an FTL source into an AST.
///
/// All errors encountered while parsing entries are returned next to the
/// resource; an error does not mean parsing failed as a whole. The regions
/// the parser could not interpret appear in the body as [`ast::Junk`].
pub fn parse(source: &str) -> (ast::Resource, Vec<ParserError>) {
    Parser::new(source).parse()
}

/// Checks if a character can begin a new entry.
fn is_entry_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '#' || c == '-'
}

/// Checks if a character can begin an identifier.
fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Checks if a character can continue an identifier.
fn is_identifier_following(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// The FTL parser.
pub struct Parser {
    stream: Stream,
}

impl Parser {
    /// Create a new parser for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            stream: Stream::new(source),
        }
    }

    /// Parse the underlying source into a resource plus all entry errors.
    #[must_use = "parsing has no effect if the result is not used"]
    pub fn parse(mut self) -> (ast::Resource, Vec<ParserError>) {
        // Blank space at the beginning of the file is ignored.
        self.skip_blank_block();

        let mut errors = Vec::new();
        let mut body: Vec<ast::Entry> = Vec::new();
        let mut last_comment: Option<ast::Comment> = None;

        while self.stream.has_next() {
            let mut entry = match self.parse_entry_or_junk() {
                Ok((entry, side_error)) => {
                    errors.extend(side_error);
                    entry
                }
                Err((junk, error)) => {
                    // A buffered comment never survives across a failed
                    // entry; it goes out standalone ahead of the junk.
                    if let Some(comment) = last_comment.take() {
                        body.push(ast::Entry::Comment(comment));
                    }
                    errors.push(error);
                    body.push(ast::Entry::Junk(junk));
                    continue;
                }
            };

            // Blank space between entries is ignored.
            let blank_lines = self.skip_blank_block();

            // A plain comment directly above the next entry is held back: it
            // may belong to a following message or term.
            if let ast::Entry::Comment(comment) = &entry {
                if blank_lines == 0 && self.stream.has_next() {
                    last_comment = Some(comment.clone());
                    continue;
                }
            }

            if let Some(comment) = last_comment.take() {
                match &mut entry {
                    ast::Entry::Message(message) => {
                        message.span.start = comment.span.start;
                        message.comment = Some(comment);
                    }
                    ast::Entry::Term(term) => {
                        term.span.start = comment.span.start;
                        term.comment = Some(comment);
                    }
                    _ => body.push(ast::Entry::Comment(comment)),
                }
            }

            body.push(entry);
        }

        if let Some(comment) = last_comment.take() {
            body.push(ast::Entry::Comment(comment));
        }

        debug!(
            entries = body.len(),
            errors = errors.len(),
            "parsed ftl resource"
        );

        let resource = ast::Resource {
            body,
            span: Span::new(0, self.stream.src_len()),
        };
        (resource, errors)
    }

    /// Try to parse a single entry; on failure, synthesize a junk node
    /// covering the broken region and resume at the next entry boundary.
    fn parse_entry_or_junk(
        &mut self,
    ) -> Result<(ast::Entry, Option<ParserError>), (ast::Junk, ParserError)> {
        let start = self.stream.pos();

        let error = match self.parse_entry() {
            Ok((entry, side_error)) => match self.expect(EOL) {
                Ok(()) => return Ok((entry, side_error)),
                Err(error) => error,
            },
            Err(error) => error,
        };

        // Roll back to the last EOL before the failure so the whole broken
        // line lands in the junk content.
        let error_pos = self.stream.pos();
        if let Some(last_eol) = self.stream.src()[..error_pos]
            .iter()
            .rposition(|&c| c == EOL)
        {
            if start < last_eol {
                self.stream.set_pos(last_eol);
            }
        }

        // Scan for the next EOL immediately followed by a character that may
        // introduce a new entry and resume right after it.
        let mut cur = 0;
        let mut found_boundary = false;
        loop {
            match self.stream.peek_nth(cur) {
                None => break,
                Some(EOL) => {
                    if matches!(self.stream.peek_nth(cur + 1), Some(c) if is_entry_start(c)) {
                        found_boundary = true;
                        break;
                    }
                    cur += 1;
                }
                Some(_) => cur += 1,
            }
        }
        self.stream.skip(if found_boundary { cur + 1 } else { cur });

        let end = self.stream.pos();
        let content: String = self.stream.src()[start..end].iter().collect();
        let junk = ast::Junk {
            content,
            annotations: vec![error.to_string()],
            span: Span::new(start, end),
        };
        Err((junk, error))
    }

    /// Parse one entry, dispatching on its first character.
    ///
    /// The second tuple field is a non-fatal side error: a message whose
    /// value parsed but whose attributes did not is still returned, together
    /// with the attribute error.
    fn parse_entry(&mut self) -> Result<(ast::Entry, Option<ParserError>), ParserError> {
        match self.stream.peek() {
            Some('#') => self.parse_comment().map(|entry| (entry, None)),
            Some('-') => self
                .parse_term()
                .map(|term| (ast::Entry::Term(term), None)),
            _ => self
                .parse_message()
                .map(|(message, side_error)| (ast::Entry::Message(message), side_error)),
        }
    }

    /// Parse a comment entry. The number of leading `#`s (1-3) fixes the
    /// level for every line of the comment.
    fn parse_comment(&mut self) -> Result<ast::Entry, ParserError> {
        let start = self.stream.pos();

        let mut level = 0;
        while self.stream.peek_nth(level) == Some('#') && level < 3 {
            level += 1;
        }

        let mut content = String::new();
        'lines: loop {
            self.stream.skip(level);

            if self.stream.peek() != Some(EOL) {
                // The '#'s have to be followed by a space.
                self.expect(' ')?;
                let line = self.stream.peek_until(|c| c == EOL);
                self.stream.skip(line.len());
                content.extend(line);
            }

            // The comment continues only if the next line carries the same
            // number of '#'s followed by a space or EOL.
            for i in 0..level {
                if self.stream.peek_nth(1 + i) != Some('#') {
                    break 'lines;
                }
            }
            match self.stream.peek_nth(level + 1) {
                Some(' ') | Some(EOL) => {}
                _ => break,
            }

            content.push(EOL);
            self.stream.skip(1);
        }

        let span = Span::new(start, self.stream.pos());
        Ok(match level {
            1 => ast::Entry::Comment(ast::Comment { content, span }),
            2 => ast::Entry::GroupComment(ast::GroupComment { content, span }),
            3 => ast::Entry::ResourceComment(ast::ResourceComment { content, span }),
            _ => unreachable!("comment level is fixed by the leading '#' count"),
        })
    }

    /// Parse a term entry: `-` identifier `=` pattern attributes*.
    fn parse_term(&mut self) -> Result<ast::Term, ParserError> {
        let start = self.stream.pos();

        self.expect('-')?;
        let id = self.parse_identifier()?;

        // Whitespace before the '=' is ignored.
        self.skip_blank_inline();
        self.expect('=')?;

        let value = match self.parse_optional_pattern()? {
            Some(pattern) => pattern,
            None => {
                return Err(ParserError::new(
                    start,
                    self.stream.pos(),
                    "a pattern is required for terms",
                ))
            }
        };

        let attributes = self.parse_attributes()?;

        Ok(ast::Term {
            id,
            value,
            attributes,
            comment: None,
            span: Span::new(start, self.stream.pos()),
        })
    }

    /// Parse a message entry: identifier `=` pattern? attributes*.
    fn parse_message(&mut self) -> Result<(ast::Message, Option<ParserError>), ParserError> {
        let start = self.stream.pos();

        let id = self.parse_identifier()?;

        // Whitespace before the '=' is ignored.
        self.skip_blank_inline();
        self.expect('=')?;

        // The value is optional as long as attributes are present.
        let value = self.parse_optional_pattern()?;

        // A failure inside the attributes does not void the message: the
        // cursor is restored and the error travels along as a side error.
        let mut side_error = None;
        let before_attributes = self.stream.pos();
        let attributes = match self.parse_attributes() {
            Ok(attributes) => attributes,
            Err(error) => {
                self.stream.set_pos(before_attributes);
                side_error = Some(error);
                Vec::new()
            }
        };

        if value.is_none() && attributes.is_empty() {
            return Err(ParserError::new(
                start,
                self.stream.pos(),
                "message entries may not be completely blank",
            ));
        }

        Ok((
            ast::Message {
                id,
                value,
                attributes,
                comment: None,
                span: Span::new(start, self.stream.pos()),
            },
            side_error,
        ))
    }

    /// Parse all `.key = pattern` attributes following the current position.
    fn parse_attributes(&mut self) -> Result<Vec<ast::Attribute>, ParserError> {
        let mut attributes = Vec::new();

        loop {
            let blank = self.peek_blank();
            if self.stream.peek_nth(blank.len()) != Some('.') {
                break;
            }
            self.stream.skip(blank.len());
            attributes.push(self.parse_attribute()?);
        }

        Ok(attributes)
    }

    /// Parse a single attribute.
    fn parse_attribute(&mut self) -> Result<ast::Attribute, ParserError> {
        let start = self.stream.pos();

        self.expect('.')?;
        let id = self.parse_identifier()?;

        self.skip_blank_inline();
        self.expect('=')?;

        let value = match self.parse_optional_pattern()? {
            Some(pattern) => pattern,
            None => {
                return Err(ParserError::new(
                    start,
                    self.stream.pos(),
                    "a value for the attribute is required",
                ))
            }
        };

        Ok(ast::Attribute {
            id,
            value,
            span: Span::new(start, self.stream.pos()),
        })
    }

    /// Parse an identifier: `[A-Za-z][A-Za-z0-9_-]*`.
    fn parse_identifier(&mut self) -> Result<ast::Identifier, ParserError> {
        let start = self.stream.pos();

        let mut name = String::new();
        match self.stream.peek() {
            Some(c) if is_identifier_start(c) => {
                name.push(c);
                self.stream.skip(1);
            }
            _ => {
                return Err(ParserError::new(
                    start,
                    start,
                    "invalid identifier start character (only a-zA-Z are allowed)",
                ))
            }
        }

        while let Some(c) = self.stream.peek() {
            if !is_identifier_following(c) {
                break;
            }
            name.push(c);
            self.stream.skip(1);
        }

        Ok(ast::Identifier {
            name,
            span: Span::new(start, self.stream.pos()),
        })
    }

    // ============================================================
    // Blank-space helpers
    // ============================================================

    /// Peek the run of spaces at the cursor.
    fn peek_blank_inline(&self) -> Vec<char> {
        self.stream.peek_until(|c| c != ' ')
    }

    /// Skip the run of spaces at the cursor.
    fn skip_blank_inline(&mut self) {
        let blank = self.peek_blank_inline();
        self.stream.skip(blank.len());
    }

    /// Peek the run of blank *lines* at the cursor: sequences of inline
    /// blanks terminated by an EOL. Returns one EOL per blank line plus the
    /// total logical offset covered.
    fn peek_blank_block(&self) -> (Vec<char>, usize) {
        let mut blank = Vec::new();
        let mut offset = 0;
        loop {
            let inline = self.stream.peek_until_from_offset(offset, |c| c != ' ');
            if self.stream.peek_nth(offset + inline.len()) == Some(EOL) {
                blank.push(EOL);
                offset += inline.len() + 1;
            } else {
                break;
            }
        }
        (blank, offset)
    }

    /// Skip the run of blank lines at the cursor; returns how many lines
    /// were skipped.
    fn skip_blank_block(&mut self) -> usize {
        let (blank, offset) = self.peek_blank_block();
        self.stream.skip(offset);
        blank.len()
    }

    /// Peek the run of spaces and EOLs at the cursor.
    fn peek_blank(&self) -> Vec<char> {
        self.stream.peek_until(|c| c != ' ' && c != EOL)
    }

    /// Skip the run of spaces and EOLs at the cursor.
    fn skip_blank(&mut self) {
        let blank = self.peek_blank();
        self.stream.skip(blank.len());
    }

    /// Consume the expected character, or error. Expecting an EOL at the end
    /// of input succeeds.
    fn expect(&mut self, expected: char) -> Result<(), ParserError> {
        if expected == EOL && self.stream.peek().is_none() {
            return Ok(());
        }
        if self.stream.peek() != Some(expected) {
            let pos = self.stream.pos();
            let shown = if expected == EOL {
                "\\n".to_string()
            } else {
                expected.to_string()
            };
            return Err(ParserError::new(pos, pos, format!("'{shown}' expected")));
        }
        self.stream.skip(1);
        Ok(())
    }
}
