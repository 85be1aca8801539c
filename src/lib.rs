//! # fluently
//!
//! A Fluent (FTL) localization core: a parser that turns Fluent Translation
//! List source text into an abstract syntax tree, and a resolver that
//! formats named messages from that tree against caller-supplied variables
//! and functions.
//!
//! ## Pipeline
//!
//! ```text
//! FTL source -> Stream -> Parser -> AST -> Resource -> Bundle -> format_message
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fluently::{Bundle, FormatContext, Resource};
//! use unic_langid::langid;
//!
//! let (resource, errors) = Resource::from_source("hello = Hello, { $name }!\n");
//! assert!(errors.is_empty());
//!
//! let mut bundle = Bundle::new(langid!("en"), []);
//! assert!(bundle.add_resource(resource).is_empty());
//!
//! let contexts = [FormatContext::with_variable("name", "Rust")];
//! let (value, warnings) = bundle.format_message("hello", &contexts).unwrap();
//! assert_eq!(value, "Hello, Rust!");
//! assert!(warnings.is_empty());
//! ```
//!
//! ## Error Handling
//!
//! Errors are layered by how far they reach:
//!
//! - [`ParserError`] - one per malformed entry; the offending region becomes
//!   an [`ast::Junk`] node and parsing continues.
//! - [`ResolverError`] - non-fatal formatting problems (unknown variables,
//!   missing attributes, …); the message still renders, with `{…}` holes
//!   where values were missing.
//! - [`FormatError`] - the requested message does not exist; the only fatal
//!   case.
//!
//! ## Module Overview
//!
//! - [`ast`] - Abstract Syntax Tree types and their JSON serialization
//! - [`bundle`] - Message registries, locale chain, format contexts
//! - [`diagnostics`] - Pretty-printed parse error reports
//! - [`parser`] - The recursive descent FTL parser
//! - [`resource`] - Message/term extraction from parsed trees
//! - [`span`] - Source location tracking
//! - [`value`] - The value model shared by resolver and callers

pub mod ast;
pub mod bundle;
pub mod diagnostics;
pub mod parser;
pub mod resource;
pub mod span;
pub mod value;

mod resolver;

// Re-export commonly used types
pub use bundle::{Bundle, BundleError, FormatContext, FormatError};
pub use parser::{parse, Parser, ParserError};
pub use resolver::ResolverError;
pub use resource::Resource;
pub use span::Span;
pub use value::{Function, Value};
