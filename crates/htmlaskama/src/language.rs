//! The Htmlaskama language handle.
//!
//! A [`Language`] describes the compiled grammar: its name, version, and the
//! set of named syntax node kinds. It is also the parsing entry point: a
//! handle turns source text into a [`Document`].

use htmlaskama_ast::{Document, NodeKind, ParseError};
use serde_json::{json, Value};

const LANGUAGE_NAME: &str = "htmlaskama";
/// Bumped whenever the set of node kinds changes shape.
const LANGUAGE_VERSION: usize = 1;

/// Returns the [`Language`] handle for Htmlaskama templates.
///
/// # Example
///
/// ```rust
/// let language = htmlaskama::language();
/// assert_eq!(language.name(), "htmlaskama");
/// let document = language.parse("Hello").unwrap();
/// assert_eq!(document.to_sexp(), "(document (content))");
/// ```
pub fn language() -> Language {
    Language {
        kinds: NodeKind::ALL,
    }
}

/// An opaque handle describing the Htmlaskama grammar.
#[derive(Debug, Clone, Copy)]
pub struct Language {
    kinds: &'static [NodeKind],
}

impl Language {
    /// The grammar name.
    pub fn name(&self) -> &'static str {
        LANGUAGE_NAME
    }

    /// The grammar version.
    pub fn version(&self) -> usize {
        LANGUAGE_VERSION
    }

    /// Number of named node kinds in the grammar.
    pub fn node_kind_count(&self) -> usize {
        self.kinds.len()
    }

    /// Every named node kind, in grammar order.
    pub fn node_kinds(&self) -> &'static [NodeKind] {
        self.kinds
    }

    /// Look up a node kind by its grammar name.
    pub fn kind_for_name(&self, name: &str) -> Option<NodeKind> {
        NodeKind::from_name(name)
    }

    /// Parse template source into a syntax tree.
    pub fn parse(&self, source: &str) -> Result<Document, ParseError> {
        htmlaskama_ast::parse(source)
    }

    /// JSON description of the named node kinds.
    pub fn node_types_json(&self) -> Value {
        Value::Array(
            self.kinds
                .iter()
                .map(|kind| json!({ "type": kind.as_str(), "named": true }))
                .collect(),
        )
    }
}
