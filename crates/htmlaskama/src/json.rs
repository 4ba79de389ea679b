//! JSON export of a parsed syntax tree, for editor and tooling consumers.

use serde_json::{json, Value};

use htmlaskama_ast::{
    AttrConditional, AttrItem, AttrValue, Document, Node, Statement,
};

/// Serialize a document to a JSON tree of `{ kind, line, column, ... }`
/// objects.
pub fn document_to_json(document: &Document) -> Value {
    json!({
        "kind": "document",
        "children": document.nodes().iter().map(node_to_json).collect::<Vec<_>>(),
    })
}

fn node_to_json(node: &Node) -> Value {
    let location = node.location();
    match node {
        Node::Text(text) => json!({
            "kind": "content",
            "line": location.line,
            "column": location.column,
            "text": text.content,
        }),
        Node::Comment(comment) => json!({
            "kind": "comment",
            "line": location.line,
            "column": location.column,
            "text": comment.text,
        }),
        Node::Expression(expr) => json!({
            "kind": "expression",
            "line": location.line,
            "column": location.column,
            "content": expr.text(),
        }),
        Node::Element(element) => json!({
            "kind": "element",
            "line": location.line,
            "column": location.column,
            "name": element.name,
            "self_closing": element.self_closing,
            "attributes": element.items.iter().map(attr_item_to_json).collect::<Vec<_>>(),
            "children": element.children.iter().map(node_to_json).collect::<Vec<_>>(),
        }),
        Node::Statement(statement) => statement_to_json(statement),
    }
}

fn statement_to_json(statement: &Statement) -> Value {
    let location = statement.location();
    match statement {
        Statement::If(stmt) => {
            let mut value = json!({
                "kind": "if_statement",
                "line": location.line,
                "column": location.column,
                "condition": stmt.condition_text(),
                "then": stmt.then_branch.iter().map(node_to_json).collect::<Vec<_>>(),
            });
            if !stmt.elif_branches.is_empty() {
                value["elif"] = Value::Array(
                    stmt.elif_branches
                        .iter()
                        .map(|branch| {
                            json!({
                                "condition": branch.condition.trim(),
                                "body": branch.body.iter().map(node_to_json).collect::<Vec<_>>(),
                            })
                        })
                        .collect(),
                );
            }
            if let Some(else_branch) = &stmt.else_branch {
                value["else"] =
                    Value::Array(else_branch.iter().map(node_to_json).collect());
            }
            value
        }
        Statement::Block(block) => json!({
            "kind": "block_statement",
            "line": location.line,
            "column": location.column,
            "name": block.name,
            "body": block.body.iter().map(node_to_json).collect::<Vec<_>>(),
        }),
        Statement::Include(stmt) => json!({
            "kind": "include_statement",
            "line": location.line,
            "column": location.column,
            "path": stmt.path,
        }),
        Statement::Extends(stmt) => json!({
            "kind": "extends_statement",
            "line": location.line,
            "column": location.column,
            "path": stmt.path,
        }),
    }
}

fn attr_item_to_json(item: &AttrItem) -> Value {
    match item {
        AttrItem::Attribute(attr) => {
            let value = match &attr.value {
                None => Value::Null,
                Some(AttrValue::Unquoted(v)) | Some(AttrValue::Quoted(v)) => {
                    Value::String(v.clone())
                }
            };
            json!({
                "kind": "attribute",
                "name": attr.name,
                "value": value,
            })
        }
        AttrItem::Conditional(cond) => conditional_to_json(cond),
    }
}

fn conditional_to_json(cond: &AttrConditional) -> Value {
    let mut value = json!({
        "kind": "if_statement",
        "condition": cond.condition.trim(),
        "then": cond.then_items.iter().map(attr_item_to_json).collect::<Vec<_>>(),
    });
    if !cond.elif_branches.is_empty() {
        value["elif"] = Value::Array(
            cond.elif_branches
                .iter()
                .map(|branch| {
                    json!({
                        "condition": branch.condition.trim(),
                        "body": branch.items.iter().map(attr_item_to_json).collect::<Vec<_>>(),
                    })
                })
                .collect(),
        );
    }
    if let Some(items) = &cond.else_items {
        value["else"] = Value::Array(items.iter().map(attr_item_to_json).collect());
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlaskama_ast::parse;

    #[test]
    fn exports_elements_and_expressions() {
        let document = parse(r#"<p class="x">{{ msg }}</p>"#).unwrap();
        let value = document_to_json(&document);
        let element = &value["children"][0];
        assert_eq!(element["kind"], "element");
        assert_eq!(element["name"], "p");
        assert_eq!(element["attributes"][0]["value"], "x");
        assert_eq!(element["children"][0]["kind"], "expression");
        assert_eq!(element["children"][0]["content"], "msg");
    }

    #[test]
    fn exports_statement_structure() {
        let document =
            parse(r#"{% if x %}{% include "a.html" %}{% else %}b{% endif %}"#).unwrap();
        let value = document_to_json(&document);
        let stmt = &value["children"][0];
        assert_eq!(stmt["kind"], "if_statement");
        assert_eq!(stmt["condition"], "x");
        assert_eq!(stmt["then"][0]["path"], "a.html");
        assert_eq!(stmt["else"][0]["kind"], "content");
    }
}
