//! Bundles: registries of messages and terms, addressed by callers.
//!
//! A [`Bundle`] owns everything formatting needs: deduplicated message and
//! term maps, the ordered locale chain (first entry is the primary locale,
//! the rest are fallbacks), and the plural-rules instance built from the
//! primary locale. Formatting itself happens in a transient resolver created
//! per [`Bundle::format_message`] call; the bundle is never mutated by it.
//!
//! Callers must serialize `add_resource*` calls with concurrent readers;
//! the bundle provides no internal locking.

use std::collections::HashMap;
use std::sync::Arc;

use intl_pluralrules::{PluralRuleType, PluralRules};
use thiserror::Error;
use tracing::{debug, trace};
use unic_langid::LanguageIdentifier;

use crate::ast;
use crate::resolver::{Resolver, ResolverError};
use crate::resource::Resource;
use crate::value::{Function, Value};

/// An error raised while registering a resource strictly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("message '{0}' is already defined")]
    MessageAlreadyDefined(String),
    #[error("term '{0}' is already defined")]
    TermAlreadyDefined(String),
}

/// The fatal outcome of [`Bundle::format_message`]: the requested message
/// does not exist. Everything else surfaces as non-fatal [`ResolverError`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("message '{0}' does not exist")]
    MessageNotFound(String),
}

/// A collection of messages and terms collected from one or many resources.
/// Provides the main API to format messages.
pub struct Bundle {
    locales: Vec<LanguageIdentifier>,
    messages: HashMap<String, ast::Message>,
    terms: HashMap<String, ast::Term>,
    plural_rules: Option<PluralRules>,
}

impl Bundle {
    /// Create an empty bundle for the given locale chain. The primary locale
    /// drives plural selection.
    pub fn new(
        primary_locale: LanguageIdentifier,
        fallback_locales: impl IntoIterator<Item = LanguageIdentifier>,
    ) -> Self {
        let plural_rules =
            PluralRules::create(primary_locale.clone(), PluralRuleType::CARDINAL).ok();

        let mut locales = vec![primary_locale];
        locales.extend(fallback_locales);

        Self {
            locales,
            messages: HashMap::new(),
            terms: HashMap::new(),
            plural_rules,
        }
    }

    /// Add a resource to the bundle, strictly: a message or term that is
    /// already defined stays as it is and produces an error. Entries that
    /// are not duplicated are registered regardless; nothing rolls back.
    pub fn add_resource(&mut self, resource: Resource) -> Vec<BundleError> {
        let mut errors = Vec::new();

        for message in resource.messages {
            let id = message.id.name.clone();
            if self.messages.contains_key(&id) {
                errors.push(BundleError::MessageAlreadyDefined(id));
                continue;
            }
            self.messages.insert(id, message);
        }
        for term in resource.terms {
            let id = term.id.name.clone();
            if self.terms.contains_key(&id) {
                errors.push(BundleError::TermAlreadyDefined(id));
                continue;
            }
            self.terms.insert(id, term);
        }

        debug!(
            messages = self.messages.len(),
            terms = self.terms.len(),
            errors = errors.len(),
            "added resource"
        );
        errors
    }

    /// Add a resource to the bundle; already defined messages and terms are
    /// overridden (last write wins).
    pub fn add_resource_overriding(&mut self, resource: Resource) {
        for message in resource.messages {
            self.messages.insert(message.id.name.clone(), message);
        }
        for term in resource.terms {
            self.terms.insert(term.id.name.clone(), term);
        }

        debug!(
            messages = self.messages.len(),
            terms = self.terms.len(),
            "added resource (overriding)"
        );
    }

    /// Whether the bundle contains a message with the given key.
    pub fn has_message(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// The bundle's locale chain; the first entry is the primary locale.
    pub fn locales(&self) -> &[LanguageIdentifier] {
        &self.locales
    }

    /// Format the message with the given key against the supplied contexts.
    ///
    /// Contexts are merged left to right, last key wins. Besides the
    /// formatted string, this returns the non-fatal errors the resolver
    /// stumbled upon; those do not mean the message failed as a whole, only
    /// that parts of it render as `{…}` holes. Only a missing message key is
    /// fatal.
    pub fn format_message(
        &self,
        key: &str,
        contexts: &[FormatContext],
    ) -> Result<(String, Vec<ResolverError>), FormatError> {
        let message = self
            .messages
            .get(key)
            .ok_or_else(|| FormatError::MessageNotFound(key.to_string()))?;

        let (variables, functions) = FormatContext::merge(contexts);
        let mut resolver = Resolver::new(self, variables, functions);

        let result = match &message.value {
            Some(pattern) => resolver.resolve_pattern(pattern).to_string(),
            None => {
                resolver.record(ResolverError::MissingValue {
                    id: key.to_string(),
                });
                String::new()
            }
        };

        let errors = resolver.into_errors();
        trace!(key, errors = errors.len(), "formatted message");
        Ok((result, errors))
    }

    pub(crate) fn message(&self, name: &str) -> Option<&ast::Message> {
        self.messages.get(name)
    }

    pub(crate) fn term(&self, name: &str) -> Option<&ast::Term> {
        self.terms.get(name)
    }

    pub(crate) fn plural_rules(&self) -> Option<&PluralRules> {
        self.plural_rules.as_ref()
    }
}

/// Variables and functions to pass to [`Bundle::format_message`].
///
/// Variable names are trimmed; function names are trimmed and upper-cased to
/// match the grammar's uppercase rule for function references.
#[derive(Clone, Default)]
pub struct FormatContext {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Function>,
}

impl FormatContext {
    /// A context holding a single variable.
    pub fn with_variable(key: &str, value: impl Into<Value>) -> Self {
        let mut variables = HashMap::new();
        variables.insert(key.trim().to_string(), value.into());
        Self {
            variables,
            functions: HashMap::new(),
        }
    }

    /// A context holding multiple variables.
    pub fn with_variables<K, V>(variables: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let variables = variables
            .into_iter()
            .map(|(key, value)| (key.as_ref().trim().to_string(), value.into()))
            .collect();
        Self {
            variables,
            functions: HashMap::new(),
        }
    }

    /// A context holding a single function.
    pub fn with_function<F>(key: &str, function: F) -> Self
    where
        F: Fn(&[Value], &HashMap<String, Value>) -> Value + Send + Sync + 'static,
    {
        let mut functions = HashMap::new();
        functions.insert(
            key.trim().to_uppercase(),
            Arc::new(function) as Function,
        );
        Self {
            variables: HashMap::new(),
            functions,
        }
    }

    /// A context holding multiple functions.
    pub fn with_functions<K>(functions: impl IntoIterator<Item = (K, Function)>) -> Self
    where
        K: AsRef<str>,
    {
        let functions = functions
            .into_iter()
            .map(|(key, function)| (key.as_ref().trim().to_uppercase(), function))
            .collect();
        Self {
            variables: HashMap::new(),
            functions,
        }
    }

    /// Merge contexts left to right, last key wins.
    fn merge(contexts: &[FormatContext]) -> (HashMap<String, Value>, HashMap<String, Function>) {
        let mut variables = HashMap::new();
        let mut functions = HashMap::new();
        for context in contexts {
            variables.extend(
                context
                    .variables
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
            functions.extend(
                context
                    .functions
                    .iter()
                    .map(|(key, function)| (key.clone(), function.clone())),
            );
        }
        (variables, functions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_missing_message_is_fatal() {
        let bundle = Bundle::new(langid!("en"), []);
        let result = bundle.format_message("missing", &[]);
        assert_eq!(
            result,
            Err(FormatError::MessageNotFound("missing".into()))
        );
        assert_eq!(
            FormatError::MessageNotFound("missing".into()).to_string(),
            "message 'missing' does not exist"
        );
    }

    #[test]
    fn test_strict_add_keeps_first_definition() {
        let mut bundle = Bundle::new(langid!("en"), []);
        let (first, _) = Resource::from_source("greeting = first\n");
        let (second, _) = Resource::from_source("greeting = second\n");
        assert!(bundle.add_resource(first).is_empty());

        let errors = bundle.add_resource(second);
        assert_eq!(
            errors,
            vec![BundleError::MessageAlreadyDefined("greeting".into())]
        );
        assert_eq!(
            errors[0].to_string(),
            "message 'greeting' is already defined"
        );

        let (result, _) = bundle.format_message("greeting", &[]).unwrap();
        assert_eq!(result, "first");
    }

    #[test]
    fn test_overriding_add_takes_last_definition() {
        let mut bundle = Bundle::new(langid!("en"), []);
        let (first, _) = Resource::from_source("greeting = first\n");
        let (second, _) = Resource::from_source("greeting = second\n");
        bundle.add_resource_overriding(first);
        bundle.add_resource_overriding(second);

        let (result, _) = bundle.format_message("greeting", &[]).unwrap();
        assert_eq!(result, "second");
    }

    #[test]
    fn test_has_message() {
        let bundle = bundle_from("hello = Hi\n-brand = Firefly\n");
        assert!(bundle.has_message("hello"));
        // Terms are not addressable as messages.
        assert!(!bundle.has_message("brand"));
        assert!(!bundle.has_message("nope"));
    }

    #[test]
    fn test_locale_chain_order() {
        let bundle = Bundle::new(langid!("de"), [langid!("en")]);
        assert_eq!(bundle.locales(), &[langid!("de"), langid!("en")][..]);
    }

    #[test]
    fn test_plural_rules_come_from_the_primary_locale_only() {
        let (resource, _) =
            Resource::from_source("n = { $n ->\n    [one] one\n   *[other] other\n}\n");
        let mut bundle = Bundle::new(langid!("zz"), [langid!("en")]);
        assert!(bundle.add_resource(resource).is_empty());

        // "zz" has no plural rules; the fallback locale does not stand in,
        // so category matching fails and selection takes the default.
        let contexts = [FormatContext::with_variable("n", 1)];
        let (result, _) = bundle.format_message("n", &contexts).unwrap();
        assert_eq!(result, "other");
    }

    #[test]
    fn test_contexts_merge_last_wins() {
        let bundle = bundle_from("who = { $name }\n");
        let contexts = [
            FormatContext::with_variable("name", "first"),
            FormatContext::with_variable("name", "second"),
        ];
        let (result, errors) = bundle.format_message("who", &contexts).unwrap();
        assert_eq!(result, "second");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_variable_names_are_trimmed() {
        let bundle = bundle_from("who = { $name }\n");
        let contexts = [FormatContext::with_variable("  name  ", "x")];
        let (result, _) = bundle.format_message("who", &contexts).unwrap();
        assert_eq!(result, "x");
    }

    #[test]
    fn test_function_names_are_uppercased() {
        let bundle = bundle_from("len = { STRLEN(\"abcde\") }\n");
        let contexts = [FormatContext::with_function("strlen", |positional, _named| {
            match positional {
                [Value::String(s)] => Value::Number(s.len() as f32),
                _ => Value::None("STRLEN".into()),
            }
        })];
        let (result, errors) = bundle.format_message("len", &contexts).unwrap();
        assert_eq!(result, "5");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_with_variables_bulk() {
        let bundle = bundle_from("pair = { $a } and { $b }\n");
        let contexts = [FormatContext::with_variables([("a", 1), ("b", 2)])];
        let (result, errors) = bundle.format_message("pair", &contexts).unwrap();
        assert_eq!(result, "1 and 2");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_with_functions_bulk() {
        let bundle = bundle_from("when = { NOW() }\n");
        let now: Function =
            Arc::new(|_positional: &[Value], _named: &HashMap<String, Value>| {
                Value::String("today".into())
            });
        let contexts = [FormatContext::with_functions([("now", now)])];
        let (result, errors) = bundle.format_message("when", &contexts).unwrap();
        assert_eq!(result, "today");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_value_less_message_formats_empty_with_warning() {
        let bundle = bundle_from("button =\n    .label = Push\n");
        let (result, errors) = bundle.format_message("button", &[]).unwrap();
        assert_eq!(result, "");
        assert_eq!(
            errors,
            vec![ResolverError::MissingValue { id: "button".into() }]
        );
    }
}
