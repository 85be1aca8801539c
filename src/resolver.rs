//! The resolver walks patterns and turns them into strings.
//!
//! A resolver lives for exactly one [`Bundle::format_message`] call. It
//! carries the caller's variables and functions, a transient parameter frame
//! for term calls, an accumulated list of non-fatal errors, and a depth
//! counter bounding reference chains. Nothing here aborts resolution: every
//! failure records an error and leaves a `{…}` hole in the output.
//!
//! [`Bundle::format_message`]: crate::bundle::Bundle::format_message

use std::collections::HashMap;

use intl_pluralrules::PluralCategory;
use thiserror::Error;

use crate::ast;
use crate::bundle::Bundle;
use crate::value::{Function, Value};

/// Reference chains longer than this abort with [`ResolverError::DepthExceeded`].
/// The FTL sources this crate consumes are written by humans; chains anywhere
/// near this length are cyclic references.
const MAX_DEPTH: usize = 64;

/// A non-fatal error recorded while resolving a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("unknown message '{id}'")]
    UnknownMessage { id: String },
    #[error("unknown message attribute '{id}.{attribute}'")]
    UnknownMessageAttribute { id: String, attribute: String },
    #[error("message '{id}' has no value")]
    MissingValue { id: String },
    #[error("unknown term '{id}'")]
    UnknownTerm { id: String },
    #[error("unknown term attribute '{id}.{attribute}'")]
    UnknownTermAttribute { id: String, attribute: String },
    #[error("unknown variable '${id}'")]
    UnknownVariable { id: String },
    #[error("unknown function '{id}'")]
    UnknownFunction { id: String },
    #[error("invalid number literal '{raw}'")]
    InvalidNumber { raw: String },
    #[error("invalid escape sequence in string literal '{raw}'")]
    InvalidEscape { raw: String },
    #[error("no default variant specified")]
    MissingDefaultVariant,
    #[error("maximum resolution depth exceeded, aborting a cyclic reference chain")]
    DepthExceeded,
}

/// Single-use pattern evaluator over one bundle.
pub(crate) struct Resolver<'bundle> {
    bundle: &'bundle Bundle,
    variables: HashMap<String, Value>,
    functions: HashMap<String, Function>,
    /// The parameter frame of the term currently being resolved, if any.
    /// While set, variable references resolve against it exclusively.
    params: Option<HashMap<String, Value>>,
    errors: Vec<ResolverError>,
    depth: usize,
}

impl<'bundle> Resolver<'bundle> {
    pub fn new(
        bundle: &'bundle Bundle,
        variables: HashMap<String, Value>,
        functions: HashMap<String, Function>,
    ) -> Self {
        Self {
            bundle,
            variables,
            functions,
            params: None,
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub fn record(&mut self, error: ResolverError) {
        self.errors.push(error);
    }

    pub fn into_errors(self) -> Vec<ResolverError> {
        self.errors
    }

    /// Resolve a pattern by concatenating the display of each element.
    pub fn resolve_pattern(&mut self, pattern: &ast::Pattern) -> Value {
        if self.depth >= MAX_DEPTH {
            self.record(ResolverError::DepthExceeded);
            return Value::None("???".into());
        }
        self.depth += 1;

        let mut result = String::new();
        for element in &pattern.elements {
            match element {
                ast::PatternElement::Text(text) => result.push_str(&text.value),
                ast::PatternElement::Placeable(placeable) => {
                    let value = self.resolve_expression(&placeable.expression);
                    result.push_str(&value.to_string());
                }
            }
        }

        self.depth -= 1;
        Value::String(result)
    }

    fn resolve_expression(&mut self, expression: &ast::Expression) -> Value {
        match expression {
            ast::Expression::Placeable(placeable) => {
                self.resolve_expression(&placeable.expression)
            }
            ast::Expression::StringLiteral(literal) => self.resolve_string_literal(literal),
            ast::Expression::NumberLiteral(literal) => self.resolve_number(&literal.value),
            ast::Expression::MessageReference(reference) => {
                self.resolve_message_reference(reference)
            }
            ast::Expression::TermReference(reference) => self.resolve_term_reference(reference),
            ast::Expression::VariableReference(reference) => {
                self.resolve_variable_reference(reference)
            }
            ast::Expression::FunctionReference(reference) => {
                self.resolve_function_reference(reference)
            }
            ast::Expression::SelectExpression(select) => self.resolve_select_expression(select),
        }
    }

    fn resolve_string_literal(&mut self, literal: &ast::StringLiteral) -> Value {
        match unescape(&literal.value) {
            Some(value) => Value::String(value),
            None => {
                self.record(ResolverError::InvalidEscape {
                    raw: literal.value.clone(),
                });
                Value::None(format!("%!(UNESCAPE {})", literal.value))
            }
        }
    }

    fn resolve_number(&mut self, raw: &str) -> Value {
        match raw.parse::<f32>() {
            Ok(value) => Value::Number(value),
            Err(_) => {
                self.record(ResolverError::InvalidNumber {
                    raw: raw.to_string(),
                });
                Value::None(format!("[{raw}]"))
            }
        }
    }

    fn resolve_message_reference(&mut self, reference: &ast::MessageReference) -> Value {
        let bundle = self.bundle;
        let id = &reference.id.name;

        let message = match bundle.message(id) {
            Some(message) => message,
            None => {
                self.record(ResolverError::UnknownMessage { id: id.clone() });
                return Value::None(id.clone());
            }
        };

        if let Some(attribute_id) = &reference.attribute {
            let attribute = message
                .attributes
                .iter()
                .find(|attribute| attribute.id.name == attribute_id.name);
            return match attribute {
                Some(attribute) => self.resolve_pattern(&attribute.value),
                None => {
                    self.record(ResolverError::UnknownMessageAttribute {
                        id: id.clone(),
                        attribute: attribute_id.name.clone(),
                    });
                    Value::None(format!("{}.{}", id, attribute_id.name))
                }
            };
        }

        match &message.value {
            Some(pattern) => self.resolve_pattern(pattern),
            None => {
                self.record(ResolverError::MissingValue { id: id.clone() });
                Value::None(id.clone())
            }
        }
    }

    fn resolve_term_reference(&mut self, reference: &ast::TermReference) -> Value {
        let bundle = self.bundle;
        let id = &reference.id.name;

        let term = match bundle.term(id) {
            Some(term) => term,
            None => {
                self.record(ResolverError::UnknownTerm { id: id.clone() });
                return Value::None(id.clone());
            }
        };

        let pattern = if let Some(attribute_id) = &reference.attribute {
            match term
                .attributes
                .iter()
                .find(|attribute| attribute.id.name == attribute_id.name)
            {
                Some(attribute) => &attribute.value,
                None => {
                    self.record(ResolverError::UnknownTermAttribute {
                        id: id.clone(),
                        attribute: attribute_id.name.clone(),
                    });
                    return Value::None(format!("{}.{}", id, attribute_id.name));
                }
            }
        } else {
            &term.value
        };

        match &reference.arguments {
            Some(arguments) => {
                // Positional arguments of a term call are evaluated for
                // their errors but carry no meaning; only the named ones
                // become the term's parameter frame.
                let (_, named) = self.assemble_arguments(arguments);
                let previous = self.params.replace(named);
                let resolved = self.resolve_pattern(pattern);
                self.params = previous;
                resolved
            }
            None => self.resolve_pattern(pattern),
        }
    }

    fn resolve_variable_reference(&mut self, reference: &ast::VariableReference) -> Value {
        let id = &reference.id.name;

        // Inside a term the parameter frame is the only scope; a missing
        // parameter is not an error, term calls routinely under-specify.
        if let Some(params) = &self.params {
            return match params.get(id) {
                Some(value) => value.clone(),
                None => Value::None(format!("${id}")),
            };
        }

        match self.variables.get(id) {
            Some(value) => value.clone(),
            None => {
                self.record(ResolverError::UnknownVariable { id: id.clone() });
                Value::None(format!("${id}"))
            }
        }
    }

    fn resolve_function_reference(&mut self, reference: &ast::FunctionReference) -> Value {
        let id = &reference.id.name;

        let function = match self.functions.get(id) {
            Some(function) => function.clone(),
            None => {
                self.record(ResolverError::UnknownFunction { id: id.clone() });
                return Value::None(id.clone());
            }
        };

        let (positional, named) = self.assemble_arguments(&reference.arguments);
        function(&positional, &named)
    }

    fn resolve_select_expression(&mut self, select: &ast::SelectExpression) -> Value {
        let selector = self.resolve_expression(&select.selector);
        if matches!(selector, Value::None(_)) {
            return self.resolve_default_variant(&select.variants);
        }

        for variant in &select.variants {
            let key = self.resolve_variant_key(&variant.key);
            if self.matches_variant(&selector, &key) {
                return self.resolve_pattern(&variant.value);
            }
        }

        self.resolve_default_variant(&select.variants)
    }

    fn resolve_default_variant(&mut self, variants: &[ast::Variant]) -> Value {
        for variant in variants {
            if variant.default {
                return self.resolve_pattern(&variant.value);
            }
        }
        self.record(ResolverError::MissingDefaultVariant);
        Value::None("???".into())
    }

    fn resolve_variant_key(&mut self, key: &ast::VariantKey) -> Value {
        match key {
            ast::VariantKey::Identifier(id) => Value::String(id.name.clone()),
            ast::VariantKey::NumberLiteral(literal) => self.resolve_number(&literal.value),
        }
    }

    /// Whether the resolved selector matches a resolved variant key.
    ///
    /// Strings match on equality. Numbers match numeric keys on equality and
    /// identifier keys on the primary locale's plural category.
    fn matches_variant(&self, selector: &Value, key: &Value) -> bool {
        match (selector, key) {
            (Value::String(selector), Value::String(key)) => selector == key,
            (Value::Number(selector), Value::Number(key)) => selector == key,
            (Value::Number(selector), Value::String(key)) => {
                match self.plural_category(*selector) {
                    Some(category) => key == category,
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// The plural category of a number under the bundle's primary locale.
    ///
    /// The value is canonicalized to two fraction digits with trailing zeros
    /// (and a bare trailing dot) removed, so `1.00` classifies as the
    /// integer `1`.
    fn plural_category(&self, value: f32) -> Option<&'static str> {
        let rules = self.bundle.plural_rules()?;
        let formatted = format!("{value:.2}");
        let canonical = formatted.trim_end_matches('0').trim_end_matches('.');
        let category = rules.select(canonical).ok()?;
        Some(plural_category_name(category))
    }

    /// Evaluate call arguments, left to right, positional then named.
    fn assemble_arguments(
        &mut self,
        arguments: &ast::CallArguments,
    ) -> (Vec<Value>, HashMap<String, Value>) {
        let mut positional = Vec::with_capacity(arguments.positional.len());
        for argument in &arguments.positional {
            positional.push(self.resolve_expression(argument));
        }

        let mut named = HashMap::with_capacity(arguments.named.len());
        for argument in &arguments.named {
            let value = self.resolve_literal(&argument.value);
            named.insert(argument.name.name.clone(), value);
        }

        (positional, named)
    }

    fn resolve_literal(&mut self, literal: &ast::Literal) -> Value {
        match literal {
            ast::Literal::String(literal) => self.resolve_string_literal(literal),
            ast::Literal::Number(literal) => self.resolve_number(&literal.value),
        }
    }
}

pub(crate) fn plural_category_name(category: PluralCategory) -> &'static str {
    match category {
        PluralCategory::ZERO => "zero",
        PluralCategory::ONE => "one",
        PluralCategory::TWO => "two",
        PluralCategory::FEW => "few",
        PluralCategory::MANY => "many",
        PluralCategory::OTHER => "other",
    }
}

/// Decode the escape sequences of a string literal: `\\`, `\"`, `\uXXXX` and
/// `\UXXXXXX`. Returns `None` when a sequence is malformed or names an
/// invalid code point (such as a lone surrogate).
fn unescape(raw: &str) -> Option<String> {
    if !raw.contains('\\') {
        return Some(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            marker @ ('u' | 'U') => {
                let digits = if marker == 'u' { 4 } else { 6 };
                let mut code: u32 = 0;
                for _ in 0..digits {
                    let digit = chars.next()?.to_digit(16)?;
                    code = code * 16 + digit;
                }
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::FormatContext;
    use crate::resource::Resource;
    use intl_pluralrules::{PluralRuleType, PluralRules};
    use unic_langid::langid;

    fn bundle_from(source: &str) -> Bundle {
        let (resource, errors) = Resource::from_source(source);
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        let mut bundle = Bundle::new(langid!("en"), []);
        let errors = bundle.add_resource(resource);
        assert!(errors.is_empty(), "add errors: {errors:?}");
        bundle
    }

    #[test]
    fn test_variable_substitution() {
        let bundle = bundle_from("greeting = Hello, { $subject }!\n");
        let contexts = [FormatContext::with_variable("subject", "world")];
        let (result, errors) = bundle.format_message("greeting", &contexts).unwrap();
        assert_eq!(result, "Hello, world!");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unknown_variable_leaves_hole() {
        let bundle = bundle_from("greeting = Hello, { $subject }!\n");
        let (result, errors) = bundle.format_message("greeting", &[]).unwrap();
        assert_eq!(result, "Hello, {$subject}!");
        assert_eq!(
            errors,
            vec![ResolverError::UnknownVariable {
                id: "subject".into()
            }]
        );
        assert_eq!(errors[0].to_string(), "unknown variable '$subject'");
    }

    const EMAILS: &str = "\
emails = { $n ->
    [one] You have one email.
   *[other] You have { $n } emails.
}
";

    #[test]
    fn test_select_plural_one() {
        let bundle = bundle_from(EMAILS);
        let contexts = [FormatContext::with_variable("n", 1)];
        let (result, errors) = bundle.format_message("emails", &contexts).unwrap();
        assert_eq!(result, "You have one email.");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_select_plural_other() {
        let bundle = bundle_from(EMAILS);
        let contexts = [FormatContext::with_variable("n", 3)];
        let (result, errors) = bundle.format_message("emails", &contexts).unwrap();
        assert_eq!(result, "You have 3 emails.");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_select_string_selector_falls_to_default() {
        let bundle = bundle_from(EMAILS);
        let contexts = [FormatContext::with_variable("n", "x")];
        let (result, errors) = bundle.format_message("emails", &contexts).unwrap();
        assert_eq!(result, "You have x emails.");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_select_unresolved_selector_falls_to_default() {
        let bundle = bundle_from(EMAILS);
        let (result, errors) = bundle.format_message("emails", &[]).unwrap();
        assert_eq!(result, "You have {$n} emails.");
        // One error for the selector, one for the placeable in the default
        // variant.
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_select_numeric_key_matches_exactly() {
        let source = "\
score = { $points ->
    [0] no points
   *[other] some points
}
";
        let bundle = bundle_from(source);
        let contexts = [FormatContext::with_variable("points", 0)];
        let (result, _) = bundle.format_message("score", &contexts).unwrap();
        assert_eq!(result, "no points");
    }

    #[test]
    fn test_plural_selection_agrees_with_classifier() {
        let variants = "\
n = { $n ->
    [zero] zero
    [one] one
    [two] two
    [few] few
    [many] many
   *[other] other
}
";
        let bundle = bundle_from(variants);
        let rules = PluralRules::create(langid!("en"), PluralRuleType::CARDINAL).unwrap();

        for n in -100i32..=100 {
            let formatted = format!("{:.2}", n as f32);
            let canonical = formatted.trim_end_matches('0').trim_end_matches('.');
            let expected = rules
                .select(canonical)
                .map(plural_category_name)
                .unwrap_or("other");

            let contexts = [FormatContext::with_variable("n", n)];
            let (result, _) = bundle.format_message("n", &contexts).unwrap();
            assert_eq!(result, expected, "plural category for {n}");
        }
    }

    #[test]
    fn test_message_reference() {
        let bundle = bundle_from("name = Fluently\nabout = About { name }\n");
        let (result, errors) = bundle.format_message("about", &[]).unwrap();
        assert_eq!(result, "About Fluently");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_message_attribute_reference() {
        let source = "\
login = Login
    .tooltip = Click to log in
hint = { login.tooltip }
";
        let bundle = bundle_from(source);
        let (result, errors) = bundle.format_message("hint", &[]).unwrap();
        assert_eq!(result, "Click to log in");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unknown_message_attribute_leaves_hole() {
        let bundle = bundle_from("login = Login\nhint = { login.tooltip }\n");
        let (result, errors) = bundle.format_message("hint", &[]).unwrap();
        assert_eq!(result, "{login.tooltip}");
        assert_eq!(
            errors,
            vec![ResolverError::UnknownMessageAttribute {
                id: "login".into(),
                attribute: "tooltip".into()
            }]
        );
    }

    #[test]
    fn test_term_arguments_shadow_caller_variables() {
        let source = "\
-thing = { $article } thing
with-args = I have { -thing(article: \"a\") }.
without-args = I have { -thing }.
";
        let bundle = bundle_from(source);

        let contexts = [FormatContext::with_variable("article", "the caller's")];
        let (result, errors) = bundle.format_message("with-args", &contexts).unwrap();
        assert_eq!(result, "I have a thing.");
        assert!(errors.is_empty());

        // Without call arguments the caller's variables apply.
        let (result, errors) = bundle.format_message("without-args", &contexts).unwrap();
        assert_eq!(result, "I have the caller's thing.");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_term_parameter_is_silent() {
        let source = "\
-thing = { $article } thing
it = { -thing(other: \"x\") }
";
        let bundle = bundle_from(source);
        let (result, errors) = bundle.format_message("it", &[]).unwrap();
        assert_eq!(result, "{$article} thing");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_nested_term_calls_restore_the_outer_frame() {
        let source = "\
-inner = { $x }
-outer = { -inner(x: \"i\") } then { $x }
call = { -outer(x: \"o\") }
";
        let bundle = bundle_from(source);
        let (result, errors) = bundle.format_message("call", &[]).unwrap();
        assert_eq!(result, "i then o");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_function_call_with_named_arguments() {
        let bundle = bundle_from("shout = { CASE(\"hi\", upper: 1) }\n");
        let contexts = [FormatContext::with_function("CASE", |positional, named| {
            let text = match positional {
                [Value::String(s)] => s.clone(),
                _ => return Value::None("CASE".into()),
            };
            match named.get("upper") {
                Some(Value::Number(n)) if *n != 0.0 => Value::String(text.to_uppercase()),
                _ => Value::String(text),
            }
        })];
        let (result, errors) = bundle.format_message("shout", &contexts).unwrap();
        assert_eq!(result, "HI");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unknown_function_leaves_hole() {
        let bundle = bundle_from("len = { STRLEN(\"abc\") }\n");
        let (result, errors) = bundle.format_message("len", &[]).unwrap();
        assert_eq!(result, "{STRLEN}");
        assert_eq!(
            errors,
            vec![ResolverError::UnknownFunction { id: "STRLEN".into() }]
        );
    }

    #[test]
    fn test_string_literal_unescapes() {
        let bundle = bundle_from(r#"esc = { "A\\B\"C" }"#);
        let (result, errors) = bundle.format_message("esc", &[]).unwrap();
        assert_eq!(result, "A\\B\"C");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_lone_surrogate_escape_leaves_hole() {
        let bundle = bundle_from(r#"bad = { "\uD83D" }"#);
        let (result, errors) = bundle.format_message("bad", &[]).unwrap();
        assert_eq!(result, r"{%!(UNESCAPE \uD83D)}");
        assert_eq!(
            errors,
            vec![ResolverError::InvalidEscape {
                raw: r"\uD83D".into()
            }]
        );
    }

    #[test]
    fn test_number_literal_formats() {
        let bundle = bundle_from("pi = { 3.14 }\nneg = { -2 }\n");
        let (result, _) = bundle.format_message("pi", &[]).unwrap();
        assert_eq!(result, "3.14");
        let (result, _) = bundle.format_message("neg", &[]).unwrap();
        assert_eq!(result, "-2");
    }

    #[test]
    fn test_cyclic_reference_terminates() {
        let bundle = bundle_from("foo = a { foo } b\n");
        let (result, errors) = bundle.format_message("foo", &[]).unwrap();
        assert!(result.contains("{???}"), "result was: {result}");
        assert!(errors.contains(&ResolverError::DepthExceeded));
    }

    #[test]
    fn test_mutually_cyclic_references_terminate() {
        let bundle = bundle_from("ping = { pong }\npong = { ping }\n");
        let (result, errors) = bundle.format_message("ping", &[]).unwrap();
        assert_eq!(result, "{???}");
        assert!(errors.contains(&ResolverError::DepthExceeded));
    }

    #[test]
    fn test_unescape_plain_passthrough() {
        assert_eq!(unescape("plain"), Some("plain".to_string()));
        assert_eq!(unescape(r"A"), Some("A".to_string()));
        assert_eq!(unescape(r"\U01F600"), Some("\u{1F600}".to_string()));
        assert_eq!(unescape(r"\uD83D"), None);
        assert_eq!(unescape(r"\q"), None);
    }
}
