//! Resources: the message/term view over a parsed AST.

use crate::ast;
use crate::parser::{self, ParserError};

/// A collection of messages and terms extracted from one FTL source.
///
/// Comments and junk entries are dropped here; a resource only carries what
/// a bundle can register. Resources are immutable once constructed.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub(crate) messages: Vec<ast::Message>,
    pub(crate) terms: Vec<ast::Term>,
}

impl Resource {
    /// Parse the given source and assemble its entries into a resource.
    ///
    /// The parse errors are returned alongside; as long as
    /// [`Resource::is_empty`] is false, at least something was parsed
    /// successfully.
    pub fn from_source(source: &str) -> (Self, Vec<ParserError>) {
        let (parsed, errors) = parser::parse(source);
        (Self::from(parsed), errors)
    }

    /// Whether the resource holds no messages and no terms.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.terms.is_empty()
    }
}

impl From<ast::Resource> for Resource {
    fn from(resource: ast::Resource) -> Self {
        let mut messages = Vec::new();
        let mut terms = Vec::new();
        for entry in resource.body {
            match entry {
                ast::Entry::Message(message) => messages.push(message),
                ast::Entry::Term(term) => terms.push(term),
                _ => {}
            }
        }
        Self { messages, terms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_messages_and_terms() {
        let source = "# note\nhello = Hi\n-brand = Firefly\n";
        let (resource, errors) = Resource::from_source(source);
        assert!(errors.is_empty());
        assert_eq!(resource.messages.len(), 1);
        assert_eq!(resource.terms.len(), 1);
        assert!(!resource.is_empty());
    }

    #[test]
    fn test_junk_and_comments_are_dropped() {
        let source = "### docs\n=broken\n";
        let (resource, errors) = Resource::from_source(source);
        assert_eq!(errors.len(), 1);
        assert!(resource.is_empty());
    }
}
