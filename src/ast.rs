//! Abstract Syntax Tree for FTL resources.
//!
//! The AST is a closed set of tagged variants rather than a class hierarchy:
//! every alternative a parent can hold is an enum (`Entry`, `PatternElement`,
//! `Expression`, `VariantKey`, `Literal`), which keeps matching exhaustive
//! and serialization mechanical.
//!
//! # Structure
//!
//! - [`Resource`] - Root node holding the entry list of a whole FTL document
//! - [`Entry`] - Messages, terms, the three comment levels, and [`Junk`]
//! - [`Pattern`] - Ordered text/placeable sequence producing a string
//! - [`Expression`] - Everything that can appear inside a placeable
//!
//! # Design Notes
//!
//! - All nodes derive `Debug`, `Clone`, `PartialEq`, and `Eq` for testing.
//! - Source locations are tracked via `Span` on each node, in code-point
//!   positions of the original source.
//! - Number literals keep their raw textual form; numeric parsing happens at
//!   format time, not parse time.
//! - String literals keep escape sequences in raw escaped form; decoding
//!   happens at format time.
//!
//! # JSON serialization
//!
//! Every node serializes to a JSON object carrying a `"type"` tag next to its
//! structural fields; spans are transient and never serialized. Text elements
//! use the `"TextElement"` tag. This is the shape used by the fixture-based
//! conformance tests.

use crate::span::Span;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// The root node of a parsed FTL document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub body: Vec<Entry>,
    /// The span of the whole source.
    pub span: Span,
}

/// A top-level entry of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(Message),
    Term(Term),
    Comment(Comment),
    GroupComment(GroupComment),
    ResourceComment(ResourceComment),
    Junk(Junk),
}

impl Entry {
    pub fn span(&self) -> Span {
        match self {
            Entry::Message(e) => e.span,
            Entry::Term(e) => e.span,
            Entry::Comment(e) => e.span,
            Entry::GroupComment(e) => e.span,
            Entry::ResourceComment(e) => e.span,
            Entry::Junk(e) => e.span,
        }
    }
}

/// A name: `[A-Za-z][A-Za-z0-9_-]*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// A `#` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub content: String,
    pub span: Span,
}

/// A `##` group comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupComment {
    pub content: String,
    pub span: Span,
}

/// A `###` resource comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceComment {
    pub content: String,
    pub span: Span,
}

/// A named, translatable unit. At least one of `value` and `attributes` is
/// present; the parser rejects completely blank messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Identifier,
    pub value: Option<Pattern>,
    pub attributes: Vec<Attribute>,
    /// A level-0 comment directly above the message, if any.
    pub comment: Option<Comment>,
    pub span: Span,
}

/// Like a message, but addressed as `-name` and intended for internal
/// composition. Terms always have a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub id: Identifier,
    pub value: Pattern,
    pub attributes: Vec<Attribute>,
    /// A level-0 comment directly above the term, if any.
    pub comment: Option<Comment>,
    pub span: Span,
}

/// A `.key = pattern` attribute of a message or term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: Identifier,
    pub value: Pattern,
    pub span: Span,
}

/// An ordered sequence of text and placeables.
///
/// By construction: no two adjacent text elements, no empty text element, and
/// the final text element (if any) carries no trailing spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub elements: Vec<PatternElement>,
    pub span: Span,
}

/// One element of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    Text(Text),
    Placeable(Placeable),
}

/// A literal run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub value: String,
    pub span: Span,
}

/// A `{ … }` interpolation slot containing one expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeable {
    pub expression: Box<Expression>,
    pub span: Span,
}

/// Anything that can appear inside a placeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    StringLiteral(StringLiteral),
    NumberLiteral(NumberLiteral),
    MessageReference(MessageReference),
    TermReference(TermReference),
    VariableReference(VariableReference),
    FunctionReference(FunctionReference),
    SelectExpression(SelectExpression),
    Placeable(Placeable),
}

/// A quoted string literal. Escape sequences are stored in raw escaped form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

/// A number literal, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    pub value: String,
    pub span: Span,
}

/// A reference to a message, optionally to one of its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReference {
    pub id: Identifier,
    pub attribute: Option<Identifier>,
    pub span: Span,
}

/// A `-name` reference to a term, optionally with call arguments that become
/// scoped variables during the term's resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermReference {
    pub id: Identifier,
    pub attribute: Option<Identifier>,
    pub arguments: Option<CallArguments>,
    pub span: Span,
}

/// A `$name` reference to a caller-supplied variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    pub id: Identifier,
    pub span: Span,
}

/// A `NAME(…)` call to a caller-supplied function. Function names are
/// all-uppercase by grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionReference {
    pub id: Identifier,
    pub arguments: CallArguments,
    pub span: Span,
}

/// Arguments passed to a term or function reference.
///
/// By construction: named argument names are unique, and no positional
/// argument follows a named one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArguments {
    pub positional: Vec<Expression>,
    pub named: Vec<NamedArgument>,
    pub span: Span,
}

/// A `name: literal` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArgument {
    pub name: Identifier,
    pub value: Literal,
    pub span: Span,
}

/// A literal value; the only thing a named argument may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(StringLiteral),
    Number(NumberLiteral),
}

/// A `selector -> [key] pattern …` multi-branch expression.
///
/// By construction: at least one variant, exactly one marked default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectExpression {
    pub selector: Box<Expression>,
    pub variants: Vec<Variant>,
    pub span: Span,
}

/// One `[key] pattern` branch of a select expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub key: VariantKey,
    pub value: Pattern,
    pub default: bool,
    pub span: Span,
}

/// The key of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantKey {
    Identifier(Identifier),
    NumberLiteral(NumberLiteral),
}

/// Source the parser could not interpret. Junk keeps document-wide parsing
/// alive: the offending region is recorded here and parsing resumes at the
/// next entry boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junk {
    pub content: String,
    pub annotations: Vec<String>,
    pub span: Span,
}

// ============================================================
// JSON serialization
// ============================================================
//
// Implemented by hand rather than derived: each node object must lead with
// its "type" tag, spans must stay out, and enum wrappers must be transparent
// (the inner node provides the tag).

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Resource", 2)?;
        s.serialize_field("type", "Resource")?;
        s.serialize_field("body", &self.body)?;
        s.end()
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Entry::Message(e) => e.serialize(serializer),
            Entry::Term(e) => e.serialize(serializer),
            Entry::Comment(e) => e.serialize(serializer),
            Entry::GroupComment(e) => e.serialize(serializer),
            Entry::ResourceComment(e) => e.serialize(serializer),
            Entry::Junk(e) => e.serialize(serializer),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Identifier", 2)?;
        s.serialize_field("type", "Identifier")?;
        s.serialize_field("name", &self.name)?;
        s.end()
    }
}

impl Serialize for Comment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Comment", 2)?;
        s.serialize_field("type", "Comment")?;
        s.serialize_field("content", &self.content)?;
        s.end()
    }
}

impl Serialize for GroupComment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("GroupComment", 2)?;
        s.serialize_field("type", "GroupComment")?;
        s.serialize_field("content", &self.content)?;
        s.end()
    }
}

impl Serialize for ResourceComment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ResourceComment", 2)?;
        s.serialize_field("type", "ResourceComment")?;
        s.serialize_field("content", &self.content)?;
        s.end()
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Message", 5)?;
        s.serialize_field("type", "Message")?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("attributes", &self.attributes)?;
        s.serialize_field("comment", &self.comment)?;
        s.end()
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Term", 5)?;
        s.serialize_field("type", "Term")?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("attributes", &self.attributes)?;
        s.serialize_field("comment", &self.comment)?;
        s.end()
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Attribute", 3)?;
        s.serialize_field("type", "Attribute")?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Pattern", 2)?;
        s.serialize_field("type", "Pattern")?;
        s.serialize_field("elements", &self.elements)?;
        s.end()
    }
}

impl Serialize for PatternElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PatternElement::Text(e) => e.serialize(serializer),
            PatternElement::Placeable(e) => e.serialize(serializer),
        }
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Text", 2)?;
        s.serialize_field("type", "TextElement")?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

impl Serialize for Placeable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Placeable", 2)?;
        s.serialize_field("type", "Placeable")?;
        s.serialize_field("expression", &self.expression)?;
        s.end()
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expression::StringLiteral(e) => e.serialize(serializer),
            Expression::NumberLiteral(e) => e.serialize(serializer),
            Expression::MessageReference(e) => e.serialize(serializer),
            Expression::TermReference(e) => e.serialize(serializer),
            Expression::VariableReference(e) => e.serialize(serializer),
            Expression::FunctionReference(e) => e.serialize(serializer),
            Expression::SelectExpression(e) => e.serialize(serializer),
            Expression::Placeable(e) => e.serialize(serializer),
        }
    }
}

impl Serialize for StringLiteral {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("StringLiteral", 2)?;
        s.serialize_field("type", "StringLiteral")?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

impl Serialize for NumberLiteral {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("NumberLiteral", 2)?;
        s.serialize_field("type", "NumberLiteral")?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

impl Serialize for MessageReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MessageReference", 3)?;
        s.serialize_field("type", "MessageReference")?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("attribute", &self.attribute)?;
        s.end()
    }
}

impl Serialize for TermReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TermReference", 4)?;
        s.serialize_field("type", "TermReference")?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("attribute", &self.attribute)?;
        s.serialize_field("arguments", &self.arguments)?;
        s.end()
    }
}

impl Serialize for VariableReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("VariableReference", 2)?;
        s.serialize_field("type", "VariableReference")?;
        s.serialize_field("id", &self.id)?;
        s.end()
    }
}

impl Serialize for FunctionReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FunctionReference", 3)?;
        s.serialize_field("type", "FunctionReference")?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("arguments", &self.arguments)?;
        s.end()
    }
}

impl Serialize for CallArguments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CallArguments", 3)?;
        s.serialize_field("type", "CallArguments")?;
        s.serialize_field("positional", &self.positional)?;
        s.serialize_field("named", &self.named)?;
        s.end()
    }
}

impl Serialize for NamedArgument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("NamedArgument", 3)?;
        s.serialize_field("type", "NamedArgument")?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::String(e) => e.serialize(serializer),
            Literal::Number(e) => e.serialize(serializer),
        }
    }
}

impl Serialize for SelectExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SelectExpression", 3)?;
        s.serialize_field("type", "SelectExpression")?;
        s.serialize_field("selector", &self.selector)?;
        s.serialize_field("variants", &self.variants)?;
        s.end()
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Variant", 4)?;
        s.serialize_field("type", "Variant")?;
        s.serialize_field("key", &self.key)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("default", &self.default)?;
        s.end()
    }
}

impl Serialize for VariantKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VariantKey::Identifier(e) => e.serialize(serializer),
            VariantKey::NumberLiteral(e) => e.serialize(serializer),
        }
    }
}

impl Serialize for Junk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Junk", 3)?;
        s.serialize_field("type", "Junk")?;
        s.serialize_field("content", &self.content)?;
        s.serialize_field("annotations", &self.annotations)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_serializes_with_type_tag() {
        let id = Identifier {
            name: "hello".into(),
            span: Span::new(0, 5),
        };
        assert_eq!(
            serde_json::to_value(&id).unwrap(),
            json!({"type": "Identifier", "name": "hello"})
        );
    }

    #[test]
    fn test_text_uses_text_element_tag() {
        let text = Text {
            value: "hi".into(),
            span: Span::new(0, 2),
        };
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            json!({"type": "TextElement", "value": "hi"})
        );
    }

    #[test]
    fn test_message_serializes_missing_value_as_null() {
        let message = Message {
            id: Identifier {
                name: "m".into(),
                span: Span::default(),
            },
            value: None,
            attributes: vec![],
            comment: None,
            span: Span::default(),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "Message",
                "id": {"type": "Identifier", "name": "m"},
                "value": null,
                "attributes": [],
                "comment": null
            })
        );
    }

    #[test]
    fn test_spans_never_serialize() {
        let junk = Junk {
            content: "???".into(),
            annotations: vec!["bad".into()],
            span: Span::new(3, 6),
        };
        let value = serde_json::to_value(&junk).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("span"));
        assert_eq!(object["type"], "Junk");
    }
}
