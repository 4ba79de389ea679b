//! htmlaskama - syntax trees and tooling for Askama HTML templates
//!
//! The crate parses Askama-flavored HTML templates into a typed syntax tree
//! and layers template tooling on top:
//! - a [`Language`] handle describing the grammar and driving the parser
//! - structural validation (extends placement, block uniqueness, path rules)
//! - an [`Outline`] of the template-inheritance surface
//! - a [`TemplateLoader`] resolving referenced templates on disk
//! - JSON export of parsed trees
//!
//! # Example
//!
//! ```rust
//! let document = htmlaskama::parse(r#"<h1 class="title">{{ title }}</h1>"#).unwrap();
//!
//! assert_eq!(
//!     document.to_sexp(),
//!     "(document (element (start_tag (tag_name) (attribute (attribute_name) \
//!      (quoted_attribute_value (attribute_value)))) (expression (expression_content)) \
//!      (end_tag (tag_name))))"
//! );
//! ```

// Public modules
pub mod error;
pub mod language;
pub mod outline;
pub mod template_loader;
pub mod validator;

mod json;

pub use error::{HtmlaskamaError, Result};
pub use htmlaskama_ast::{
    AttrConditional, AttrItem, AttrValue, Attribute, BlockStatement, CommentNode, Document,
    ElifBranch, Element, Expression, ExtendsStatement, IfStatement, IncludeStatement, Location,
    Node, NodeKind, ParseError, Statement, TextNode,
};
pub use json::document_to_json;
pub use language::{language, Language};
pub use outline::{BlockRef, Outline, TemplateRef};
pub use template_loader::TemplateLoader;

use std::path::{Path, PathBuf};

/// Main template struct for parsing once and querying multiple times.
pub struct Htmlaskama {
    document: Document,
    template_root: Option<PathBuf>,
}

impl Htmlaskama {
    /// Parse a template source string.
    ///
    /// # Example
    ///
    /// ```rust
    /// let tmpl = htmlaskama::Htmlaskama::parse("{% block body %}{% endblock %}").unwrap();
    /// assert_eq!(tmpl.outline().blocks[0].name, "body");
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        let document = language().parse(source)?;
        Ok(Self {
            document,
            template_root: None,
        })
    }

    /// Parse a template whose `include` / `extends` references resolve
    /// against `template_root`.
    pub fn parse_with_templates(source: &str, template_root: impl AsRef<Path>) -> Result<Self> {
        let document = language().parse(source)?;
        Ok(Self {
            document,
            template_root: Some(template_root.as_ref().to_path_buf()),
        })
    }

    /// Get a reference to the parsed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The template-inheritance surface of the document.
    pub fn outline(&self) -> Outline {
        Outline::of(&self.document)
    }

    /// Run structural validation on the document.
    pub fn validate(&self) -> Result<()> {
        validator::validate(&self.document)
    }

    /// Serialize the document to a JSON tree.
    pub fn to_json(&self) -> serde_json::Value {
        json::document_to_json(&self.document)
    }

    /// Every template transitively reachable from this document through
    /// `extends` and `include` references. Requires a template root.
    pub fn linked_templates(&self) -> Result<Vec<String>> {
        let root = self
            .template_root
            .as_ref()
            .ok_or_else(|| HtmlaskamaError::TemplateError {
                message: "no template root configured".to_string(),
            })?;
        let mut loader = TemplateLoader::new(root)?;
        loader.linked_templates(&self.document)
    }
}

/// Convenience function: parse a template source string into a document.
///
/// # Example
///
/// ```rust
/// let document = htmlaskama::parse("{{ greeting }}").unwrap();
/// assert_eq!(document.to_sexp(), "(document (expression (expression_content)))");
/// ```
pub fn parse(source: &str) -> Result<Document> {
    Ok(language().parse(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_reuse() {
        let tmpl = Htmlaskama::parse("<p>{{ msg }}</p>").unwrap();

        assert_eq!(tmpl.outline(), Outline::default());
        assert!(tmpl.validate().is_ok());
        assert_eq!(tmpl.document().nodes().len(), 1);
        assert_eq!(tmpl.to_json()["children"][0]["kind"], "element");
    }

    #[test]
    fn linked_templates_without_root_is_an_error() {
        let tmpl = Htmlaskama::parse(r#"{% include "nav.html" %}"#).unwrap();
        assert!(matches!(
            tmpl.linked_templates(),
            Err(HtmlaskamaError::TemplateError { .. })
        ));
    }

    #[test]
    fn parse_error_converts() {
        let result = parse("{{ broken");
        assert!(matches!(
            result,
            Err(HtmlaskamaError::Parse(ParseError::UnclosedDelimiter { .. }))
        ));
    }
}
