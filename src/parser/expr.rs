//! Placeable and expression parsing.
//!
//! Covers everything between `{` and `}`: inline expressions (literals and
//! references), call arguments, and select expressions with their variant
//! lists. Selector restrictions (no message references, no nested
//! placeables, no plain term references) are enforced here, as is the
//! uppercase rule for function names.

use super::{is_identifier_start, Parser, ParserError, EOL};
use crate::ast;
use crate::span::Span;
use std::collections::HashSet;

/// A single parsed call argument, before classification.
enum Argument {
    Positional(ast::Expression),
    Named(ast::NamedArgument),
}

impl Parser {
    /// Parse a `{ expression }` placeable.
    pub(super) fn parse_placeable(&mut self) -> Result<ast::Placeable, ParserError> {
        let start = self.stream.pos();

        self.expect('{')?;
        self.skip_blank();

        let expression = self.parse_expression()?;

        self.expect('}')?;

        Ok(ast::Placeable {
            expression: Box::new(expression),
            span: Span::new(start, self.stream.pos()),
        })
    }

    /// Parse the expression inside a placeable: an inline expression,
    /// upgraded to a select expression when a `->` follows.
    fn parse_expression(&mut self) -> Result<ast::Expression, ParserError> {
        let start = self.stream.pos();

        let selector = self.parse_inline_expression()?;
        self.skip_blank();

        let is_select =
            self.stream.peek() == Some('-') && self.stream.peek_nth(1) == Some('>');

        if !is_select {
            if let ast::Expression::TermReference(term) = &selector {
                if term.attribute.is_some() {
                    return Err(ParserError::new(
                        start,
                        self.stream.pos(),
                        "term attribute references are not allowed in placeables",
                    ));
                }
            }
            return Ok(selector);
        }

        match &selector {
            ast::Expression::MessageReference(_) => {
                return Err(ParserError::new(
                    start,
                    self.stream.pos(),
                    "message references are not allowed as selectors",
                ))
            }
            ast::Expression::Placeable(_) => {
                return Err(ParserError::new(
                    start,
                    self.stream.pos(),
                    "placeables are not allowed as selectors",
                ))
            }
            ast::Expression::TermReference(term) if term.attribute.is_none() => {
                return Err(ParserError::new(
                    start,
                    self.stream.pos(),
                    "normal term references are not allowed as selectors; \
                     consider using a term attribute reference instead",
                ))
            }
            _ => {}
        }

        // Skip the '->'; nothing but blank may follow it on this line.
        self.stream.skip(2);
        self.skip_blank_inline();
        self.expect(EOL)?;

        let variants = self.parse_variants()?;

        Ok(ast::Expression::SelectExpression(ast::SelectExpression {
            selector: Box::new(selector),
            variants,
            span: Span::new(start, self.stream.pos()),
        }))
    }

    /// Parse an inline expression, dispatching on its first character.
    fn parse_inline_expression(&mut self) -> Result<ast::Expression, ParserError> {
        let start = self.stream.pos();

        let peek = match self.stream.peek() {
            Some(peek) => peek,
            None => {
                return Err(ParserError::new(start, start, "no inline expression"));
            }
        };

        // A nested placeable.
        if peek == '{' {
            return self.parse_placeable().map(ast::Expression::Placeable);
        }

        // A number literal.
        if peek.is_ascii_digit()
            || (peek == '-' && matches!(self.stream.peek_nth(1), Some(c) if c.is_ascii_digit()))
        {
            return self.parse_number().map(ast::Expression::NumberLiteral);
        }

        // A string literal.
        if peek == '"' {
            return self.parse_string().map(ast::Expression::StringLiteral);
        }

        // A variable reference.
        if peek == '$' {
            self.stream.skip(1);
            let id = self.parse_identifier()?;
            return Ok(ast::Expression::VariableReference(ast::VariableReference {
                id,
                span: Span::new(start, self.stream.pos()),
            }));
        }

        // A term reference, optionally with an attribute and call arguments.
        if peek == '-' {
            self.stream.skip(1);
            let id = self.parse_identifier()?;

            let mut attribute = None;
            if self.stream.peek() == Some('.') {
                self.stream.skip(1);
                attribute = Some(self.parse_identifier()?);
            }

            let mut arguments = None;
            let blank = self.peek_blank();
            if self.stream.peek_nth(blank.len()) == Some('(') {
                self.stream.skip(blank.len());
                arguments = Some(self.parse_call_arguments()?);
            }

            return Ok(ast::Expression::TermReference(ast::TermReference {
                id,
                attribute,
                arguments,
                span: Span::new(start, self.stream.pos()),
            }));
        }

        // What remains is a message or function reference; both start with
        // an identifier.
        if !is_identifier_start(peek) {
            return Err(ParserError::new(
                start,
                self.stream.pos(),
                "no inline expression",
            ));
        }

        let id_start = self.stream.pos();
        let id = self.parse_identifier()?;

        // A '(' after the identifier makes it a function reference.
        let blank = self.peek_blank();
        if self.stream.peek_nth(blank.len()) == Some('(') {
            if id.name.chars().any(|c| c.is_ascii_lowercase()) {
                return Err(ParserError::new(
                    id_start,
                    self.stream.pos(),
                    "function names only may have uppercase letters",
                ));
            }

            self.stream.skip(blank.len());
            let arguments = self.parse_call_arguments()?;

            return Ok(ast::Expression::FunctionReference(ast::FunctionReference {
                id,
                arguments,
                span: Span::new(start, self.stream.pos()),
            }));
        }

        let mut attribute = None;
        if self.stream.peek() == Some('.') {
            self.stream.skip(1);
            attribute = Some(self.parse_identifier()?);
        }

        Ok(ast::Expression::MessageReference(ast::MessageReference {
            id,
            attribute,
            span: Span::new(start, self.stream.pos()),
        }))
    }

    /// Parse a parenthesized call argument list.
    fn parse_call_arguments(&mut self) -> Result<ast::CallArguments, ParserError> {
        let start = self.stream.pos();

        let mut positional = Vec::new();
        let mut named: Vec<ast::NamedArgument> = Vec::new();
        let mut names = HashSet::new();

        self.expect('(')?;
        self.skip_blank();

        loop {
            if self.stream.peek() == Some(')') {
                break;
            }

            let arg_start = self.stream.pos();
            match self.parse_call_argument()? {
                Argument::Named(argument) => {
                    if !names.insert(argument.name.name.clone()) {
                        return Err(ParserError::new(
                            arg_start,
                            self.stream.pos(),
                            format!("named argument '{}' is already used", argument.name.name),
                        ));
                    }
                    named.push(argument);
                }
                Argument::Positional(expression) => {
                    if !named.is_empty() {
                        return Err(ParserError::new(
                            arg_start,
                            self.stream.pos(),
                            "positional arguments may not follow named ones",
                        ));
                    }
                    positional.push(expression);
                }
            }

            self.skip_blank();

            // A trailing comma before the ')' is allowed.
            if self.stream.peek() == Some(',') {
                self.stream.skip(1);
                self.skip_blank();
                continue;
            }

            break;
        }

        self.expect(')')?;

        Ok(ast::CallArguments {
            positional,
            named,
            span: Span::new(start, self.stream.pos()),
        })
    }

    /// Parse a single call argument. An inline expression followed by `:` is
    /// a named argument: the expression must then be a bare message
    /// reference (its identifier becomes the name) and the value a literal.
    fn parse_call_argument(&mut self) -> Result<Argument, ParserError> {
        let start = self.stream.pos();

        let expression = self.parse_inline_expression()?;
        self.skip_blank();

        if self.stream.peek() != Some(':') {
            return Ok(Argument::Positional(expression));
        }

        let name = match expression {
            ast::Expression::MessageReference(reference) if reference.attribute.is_none() => {
                reference.id
            }
            _ => {
                return Err(ParserError::new(
                    start,
                    self.stream.pos(),
                    "argument name must be a plain identifier",
                ))
            }
        };

        self.stream.skip(1);
        self.skip_blank();

        let value = self.parse_literal()?;

        Ok(Argument::Named(ast::NamedArgument {
            name,
            value,
            span: Span::new(start, self.stream.pos()),
        }))
    }

    /// Parse the variant list of a select expression. At least one variant
    /// and exactly one default are required.
    fn parse_variants(&mut self) -> Result<Vec<ast::Variant>, ParserError> {
        let start = self.stream.pos();

        let mut variants = Vec::new();
        let mut has_default = false;

        self.skip_blank();

        let mut peek = self.stream.peek();
        while peek == Some('[') || (peek == Some('*') && self.stream.peek_nth(1) == Some('[')) {
            let variant_start = self.stream.pos();

            let mut default = false;
            if peek == Some('*') {
                if has_default {
                    return Err(ParserError::new(
                        variant_start,
                        variant_start,
                        "only one default select variant is allowed",
                    ));
                }
                has_default = true;
                default = true;
                self.stream.skip(1);
            }

            self.expect('[')?;
            self.skip_blank();

            let key = self.parse_variant_key()?;

            self.skip_blank();
            self.expect(']')?;

            let value = match self.parse_optional_pattern()? {
                Some(pattern) => pattern,
                None => {
                    return Err(ParserError::new(
                        variant_start,
                        self.stream.pos(),
                        "a value for the select variant is required",
                    ))
                }
            };

            variants.push(ast::Variant {
                key,
                value,
                default,
                span: Span::new(variant_start, self.stream.pos()),
            });

            self.expect(EOL)?;
            self.skip_blank();

            peek = self.stream.peek();
        }

        if variants.is_empty() {
            return Err(ParserError::new(
                start,
                self.stream.pos(),
                "at least one variant is required",
            ));
        }
        if !has_default {
            return Err(ParserError::new(
                start,
                self.stream.pos(),
                "a default variant is required",
            ));
        }

        Ok(variants)
    }

    /// Parse a variant key: an identifier or a number literal.
    fn parse_variant_key(&mut self) -> Result<ast::VariantKey, ParserError> {
        match self.stream.peek() {
            Some(EOL) | None => {
                let pos = self.stream.pos();
                Err(ParserError::new(pos, pos, "no variant key was given"))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => {
                self.parse_number().map(ast::VariantKey::NumberLiteral)
            }
            _ => self.parse_identifier().map(ast::VariantKey::Identifier),
        }
    }

    /// Parse a literal: the only values a named argument accepts.
    fn parse_literal(&mut self) -> Result<ast::Literal, ParserError> {
        match self.stream.peek() {
            Some(c) if c.is_ascii_digit() || c == '-' => {
                self.parse_number().map(ast::Literal::Number)
            }
            Some('"') => self.parse_string().map(ast::Literal::String),
            _ => {
                let pos = self.stream.pos();
                Err(ParserError::new(
                    pos,
                    pos,
                    "invalid literal beginning (-, 0-9 or \" required)",
                ))
            }
        }
    }

    /// Parse a number literal, stored verbatim: optional `-`, digits, and an
    /// optional decimal part with at least one digit.
    fn parse_number(&mut self) -> Result<ast::NumberLiteral, ParserError> {
        let start = self.stream.pos();

        let mut raw = String::new();

        if self.stream.peek() == Some('-') {
            raw.push('-');
            self.stream.skip(1);
        }

        while let Some(c) = self.stream.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            raw.push(c);
            self.stream.skip(1);
        }

        if self.stream.peek() == Some('.') {
            raw.push('.');
            self.stream.skip(1);
            let mut has_decimal = false;
            while let Some(c) = self.stream.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                has_decimal = true;
                raw.push(c);
                self.stream.skip(1);
            }
            if !has_decimal {
                let pos = self.stream.pos();
                return Err(ParserError::new(pos, pos, "no numbers after the decimal point"));
            }
        }

        Ok(ast::NumberLiteral {
            value: raw,
            span: Span::new(start, self.stream.pos()),
        })
    }

    /// Parse a quoted string literal. Escape sequences are validated but
    /// kept in their raw escaped form; decoding happens at format time.
    fn parse_string(&mut self) -> Result<ast::StringLiteral, ParserError> {
        let start = self.stream.pos();

        self.expect('"')?;

        let mut value = String::new();
        while let Some(peek) = self.stream.peek() {
            if peek == '"' || peek == EOL {
                break;
            }
            if peek == '\\' {
                value.push_str(&self.parse_escape_sequence()?);
            } else {
                value.push(peek);
                self.stream.skip(1);
            }
        }

        self.expect('"')?;

        Ok(ast::StringLiteral {
            value,
            span: Span::new(start, self.stream.pos()),
        })
    }

    /// Parse one escape sequence: `\\`, `\"`, `\uXXXX` or `\UXXXXXX`.
    fn parse_escape_sequence(&mut self) -> Result<String, ParserError> {
        self.expect('\\')?;

        match self.stream.peek() {
            Some(c @ ('\\' | '"')) => {
                self.stream.skip(1);
                Ok(format!("\\{c}"))
            }
            Some('u') => self.parse_unicode_escape_sequence(false),
            Some('U') => self.parse_unicode_escape_sequence(true),
            _ => {
                let pos = self.stream.pos();
                Err(ParserError::new(pos, pos, "unknown escape sequence"))
            }
        }
    }

    /// Parse the hex digits of a unicode escape: 4 after `\u`, 6 after `\U`.
    fn parse_unicode_escape_sequence(&mut self, six_digits: bool) -> Result<String, ParserError> {
        let (marker, digits) = if six_digits { ('U', 6) } else { ('u', 4) };

        self.expect(marker)?;

        let mut raw = format!("\\{marker}");
        for _ in 0..digits {
            match self.stream.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    raw.push(c);
                    self.stream.skip(1);
                }
                _ => {
                    let pos = self.stream.pos();
                    return Err(ParserError::new(
                        pos,
                        pos,
                        "invalid hex digit in unicode escape (0-9a-fA-F required)",
                    ));
                }
            }
        }

        Ok(raw)
    }
}
