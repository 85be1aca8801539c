//! Diagnostic rendering for parse errors.
//!
//! The parser returns flat `{span, message}` errors; this module pretty-
//! prints them against the source with a labeled span, for tools that
//! surface malformed FTL to translators.

use crate::parser::ParserError;
use ariadne::{Color, Label, Report, ReportKind, Source};

/// Renders [`ParserError`]s against a named source.
pub struct DiagnosticEmitter<'a> {
    filename: &'a str,
    source: &'a str,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self { filename, source }
    }

    fn report(&self, error: &ParserError) -> Report<'static, (&'a str, std::ops::Range<usize>)> {
        Report::build(ReportKind::Error, self.filename, error.span.start)
            .with_message(&error.message)
            .with_label(
                Label::new((self.filename, error.span.start..error.span.end))
                    .with_color(Color::Red)
                    .with_message(&error.message),
            )
            .finish()
    }

    /// Print a diagnostic to stderr.
    pub fn emit(&self, error: &ParserError) -> std::io::Result<()> {
        self.report(error)
            .eprint((self.filename, Source::from(self.source)))
    }

    /// Render a diagnostic into a string, without colors. Used by tooling
    /// that collects diagnostics instead of printing them.
    pub fn render(&self, error: &ParserError) -> std::io::Result<String> {
        let mut buffer = Vec::new();
        self.report(error)
            .write((self.filename, Source::from(self.source)), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn test_render_includes_message_and_filename() {
        let source = "good = ok\nbroken == bad\nalso = fine\n";
        let (_, errors) = parser::parse(source);
        assert_eq!(errors.len(), 1);

        let emitter = DiagnosticEmitter::new("app.ftl", source);
        let rendered = emitter.render(&errors[0]).unwrap();
        assert!(rendered.contains("app.ftl"));
        assert!(rendered.contains(&errors[0].message));
    }
}
