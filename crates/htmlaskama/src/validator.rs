//! Document-level structural validation.
//!
//! The parser guarantees well-formed pairing; this module checks the rules
//! that live above the grammar: `extends` placement, block-name uniqueness,
//! and template-path syntax for `include` / `extends` references.

use std::collections::HashSet;

use htmlaskama_ast::{Document, Location, Node, Statement};

use crate::error::{HtmlaskamaError, Result};

/// Run every structural check on a parsed document.
pub fn validate(document: &Document) -> Result<()> {
    validate_extends(document)?;
    validate_blocks(document)?;
    validate_paths(document)?;
    Ok(())
}

/// `extends` must be the first node of the document and appear at most once.
fn validate_extends(document: &Document) -> Result<()> {
    let mut locations: Vec<Location> = Vec::new();
    document.for_each_node(&mut |node| {
        if let Node::Statement(Statement::Extends(stmt)) = node {
            locations.push(stmt.location);
        }
    });

    match locations.len() {
        0 => Ok(()),
        1 => {
            let first = matches!(
                document.nodes().first(),
                Some(Node::Statement(Statement::Extends(_)))
            );
            if first {
                Ok(())
            } else {
                Err(HtmlaskamaError::MisplacedExtends {
                    location: locations[0],
                })
            }
        }
        _ => Err(HtmlaskamaError::MultipleExtends {
            location: locations[1],
        }),
    }
}

/// Block names must be unique across the whole document, nested blocks
/// included.
fn validate_blocks(document: &Document) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicate: Option<(String, Location)> = None;
    document.for_each_node(&mut |node| {
        if let Node::Statement(Statement::Block(block)) = node {
            if duplicate.is_none() && !seen.insert(block.name.clone()) {
                duplicate = Some((block.name.clone(), block.location));
            }
        }
    });
    match duplicate {
        Some((name, location)) => Err(HtmlaskamaError::DuplicateBlock { name, location }),
        None => Ok(()),
    }
}

fn validate_paths(document: &Document) -> Result<()> {
    let mut bad: Option<HtmlaskamaError> = None;
    document.for_each_node(&mut |node| {
        if bad.is_some() {
            return;
        }
        let path = match node {
            Node::Statement(Statement::Include(stmt)) => Some(&stmt.path),
            Node::Statement(Statement::Extends(stmt)) => Some(&stmt.path),
            _ => None,
        };
        if let Some(path) = path {
            if let Err(error) = validate_template_path(path) {
                bad = Some(error);
            }
        }
    });
    match bad {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Validate an `include` / `extends` template path.
///
/// Rules:
/// - Must be non-empty and relative
/// - Cannot contain `..` (path traversal)
/// - Cannot contain `//` (double slash)
/// - Cannot contain `\` or `:` (Windows separators and drive letters)
pub fn validate_template_path(path: &str) -> Result<()> {
    let reject = |message: &str| {
        Err(HtmlaskamaError::InvalidTemplatePath {
            path: path.to_string(),
            message: message.to_string(),
        })
    };

    if path.is_empty() {
        return reject("path is empty");
    }
    if path.starts_with('/') {
        return reject("path must be relative");
    }
    if path.contains("..") {
        return reject("path cannot contain '..'");
    }
    if path.contains("//") {
        return reject("path cannot contain '//'");
    }
    if path.contains('\\') {
        return reject("path cannot contain '\\'");
    }
    if path.contains(':') {
        return reject("path cannot contain ':'");
    }
    Ok(())
}
