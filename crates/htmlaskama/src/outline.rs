//! Template outline: the inheritance surface of a parsed document.

use serde::Serialize;

use htmlaskama_ast::{Document, Node, Statement};

/// Summary of a document's template-inheritance surface: the parent it
/// extends, the blocks it declares, and the templates it includes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub extends: Option<TemplateRef>,
    pub blocks: Vec<BlockRef>,
    pub includes: Vec<TemplateRef>,
}

/// Reference to another template by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRef {
    pub path: String,
    pub line: usize,
    pub column: usize,
}

/// A declared block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRef {
    pub name: String,
    pub line: usize,
    pub column: usize,
}

impl Outline {
    /// Walk the document and collect its outline, in document order.
    pub fn of(document: &Document) -> Outline {
        let mut outline = Outline::default();
        document.for_each_node(&mut |node| {
            if let Node::Statement(statement) = node {
                match statement {
                    Statement::Extends(stmt) => {
                        if outline.extends.is_none() {
                            outline.extends = Some(TemplateRef {
                                path: stmt.path.clone(),
                                line: stmt.location.line,
                                column: stmt.location.column,
                            });
                        }
                    }
                    Statement::Block(block) => outline.blocks.push(BlockRef {
                        name: block.name.clone(),
                        line: block.location.line,
                        column: block.location.column,
                    }),
                    Statement::Include(stmt) => outline.includes.push(TemplateRef {
                        path: stmt.path.clone(),
                        line: stmt.location.line,
                        column: stmt.location.column,
                    }),
                    Statement::If(_) => {}
                }
            }
        });
        outline
    }

    /// Paths of every directly referenced template: the extends target first,
    /// then includes in document order.
    pub fn references(&self) -> Vec<String> {
        let mut refs = Vec::new();
        if let Some(parent) = &self.extends {
            refs.push(parent.path.clone());
        }
        refs.extend(self.includes.iter().map(|inc| inc.path.clone()));
        refs
    }
}
