//! Pattern parsing.
//!
//! Patterns come in two flavours: inline (starting on the `=` line) and
//! block (starting on a following line, recognized by its indent). During
//! collection the parser tracks indentation through temporary
//! [`PatternPart::Indent`] markers; a second pass strips the common indent,
//! joins adjacent text runs and lowers the survivors into final
//! [`ast::PatternElement`]s. Indent markers never reach the public AST.

use super::{Parser, ParserError, EOL};
use crate::ast;
use crate::span::Span;

/// A pattern element as collected, before indent processing.
enum PatternPart {
    Text(ast::Text),
    Placeable(ast::Placeable),
    Indent { value: String, span: Span },
}

impl Parser {
    /// Parse a pattern if one is present at the cursor.
    ///
    /// Returns `None` when the rest of the line is blank and no indented
    /// continuation line follows — the entry has no value at this position.
    pub(super) fn parse_optional_pattern(
        &mut self,
    ) -> Result<Option<ast::Pattern>, ParserError> {
        let blank = self.peek_blank_inline();
        let first = match self.stream.peek_nth(blank.len()) {
            Some(first) => first,
            None => return Ok(None),
        };

        // The first non-blank character being '=' means a doubled equals
        // sign ('key == value'); rejecting it here turns the typo into junk
        // instead of a text value of '= value'.
        if first == '=' {
            let pos = self.stream.pos();
            return Err(ParserError::new(pos, pos, "unexpected '='"));
        }

        // Anything else on the '=' line starts an inline pattern.
        if first != EOL {
            self.stream.skip(blank.len());
            return self.parse_pattern(false).map(Some);
        }

        // Look ahead to the first non-blank line. Its first non-blank
        // character decides whether a block pattern starts: a '{' always
        // does; otherwise the line must be indented and must not begin with
        // a character that introduces attributes or variants.
        let (_, blank_len) = self.peek_blank_block();
        let target_indent = self
            .stream
            .peek_until_from_offset(blank_len, |c| c != ' ');
        let first = self.stream.peek_nth(blank_len + target_indent.len());

        if first != Some('{')
            && (target_indent.is_empty()
                || matches!(first, Some('}') | Some('.') | Some('[') | Some('*')))
        {
            return Ok(None);
        }

        self.stream.skip(blank_len);
        self.parse_pattern(true).map(Some)
    }

    /// Parse a pattern at the cursor. `block` marks a pattern that starts on
    /// its own line, whose leading indent seeds the common indent.
    pub(super) fn parse_pattern(&mut self, block: bool) -> Result<ast::Pattern, ParserError> {
        let start = self.stream.pos();

        let mut common_indent = usize::MAX;
        let mut parts: Vec<PatternPart> = Vec::new();

        if block {
            let blank = self.peek_blank_inline();
            common_indent = blank.len();
            self.stream.skip(blank.len());
            parts.push(PatternPart::Indent {
                value: blank.iter().collect(),
                span: Span::new(start, self.stream.pos()),
            });
        }

        // Collect text, placeables and indent markers.
        while let Some(peek) = self.stream.peek() {
            if peek == '{' {
                parts.push(PatternPart::Placeable(self.parse_placeable()?));
            } else if peek == '}' {
                let pos = self.stream.pos();
                return Err(ParserError::new(pos, pos, "unexpected '}'"));
            } else if peek == EOL {
                // The pattern continues on the next line iff that line is
                // indented and its first non-blank character is legal ('{'
                // always is; '}', '.', '[' and '*' end the pattern).
                let indent_start = self.stream.pos();
                let (blank_block, blank_len) = self.peek_blank_block();
                let blank_inline = self
                    .stream
                    .peek_until_from_offset(blank_len, |c| c != ' ');
                let first = self.stream.peek_nth(blank_len + blank_inline.len());
                if first != Some('{')
                    && (blank_inline.is_empty()
                        || matches!(first, Some('}') | Some('.') | Some('[') | Some('*')))
                {
                    break;
                }
                common_indent = common_indent.min(blank_inline.len());
                self.stream.skip(blank_len + blank_inline.len());

                let value: String =
                    blank_block.iter().chain(blank_inline.iter()).collect();
                parts.push(PatternPart::Indent {
                    value,
                    span: Span::new(indent_start, self.stream.pos()),
                });
            } else {
                let text = self.parse_text();
                parts.push(PatternPart::Text(text));
            }
        }

        // Lower the collected parts: strip the common indent from every
        // marker, drop markers emptied by that, join adjacent text runs and
        // turn surviving markers into text.
        let mut elements: Vec<ast::PatternElement> = Vec::with_capacity(parts.len());
        for part in parts {
            let (value, span) = match part {
                PatternPart::Placeable(placeable) => {
                    elements.push(ast::PatternElement::Placeable(placeable));
                    continue;
                }
                PatternPart::Indent { mut value, span } => {
                    let keep = value.len().saturating_sub(common_indent);
                    value.truncate(keep);
                    if value.is_empty() {
                        continue;
                    }
                    (value, span)
                }
                PatternPart::Text(text) => (text.value, text.span),
            };

            if let Some(ast::PatternElement::Text(previous)) = elements.last_mut() {
                previous.value.push_str(&value);
                previous.span.end = span.end;
                continue;
            }

            elements.push(ast::PatternElement::Text(ast::Text { value, span }));
        }

        // Trailing spaces on a final text element are not part of the value.
        if let Some(ast::PatternElement::Text(last)) = elements.last_mut() {
            let trimmed_len = last.value.trim_end_matches(' ').len();
            last.value.truncate(trimmed_len);
            if last.value.is_empty() {
                elements.pop();
            }
        }

        Ok(ast::Pattern {
            elements,
            span: Span::new(start, self.stream.pos()),
        })
    }

    /// Consume a run of plain text, up to the next placeable brace or EOL.
    fn parse_text(&mut self) -> ast::Text {
        let start = self.stream.pos();

        let mut value = String::new();
        while let Some(peek) = self.stream.peek() {
            if peek == '{' || peek == '}' || peek == EOL {
                break;
            }
            self.stream.consume();
            value.push(peek);
        }

        ast::Text {
            value,
            span: Span::new(start, self.stream.pos()),
        }
    }
}
