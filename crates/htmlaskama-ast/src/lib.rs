//! Syntax tree, lexer, and parser for Askama-flavored HTML templates.
//!
//! `parse` turns template source into a [`Document`]: a typed tree of HTML
//! elements, `{{ ... }}` expressions, `{% ... %}` statements, text runs and
//! comments. The tree is also renderable as a tree-sitter-style s-expression
//! over named node kinds, which the integration tests lean on.

use thiserror::Error;

mod lexer;
mod parser;
mod token;

// ============================================================================
// Location
// ============================================================================

/// Location in source code (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

// ============================================================================
// Node kinds
// ============================================================================

/// The named syntax node kinds of the Htmlaskama grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Content,
    Element,
    StartTag,
    EndTag,
    SelfClosingTag,
    TagName,
    Attribute,
    AttributeName,
    AttributeValue,
    QuotedAttributeValue,
    Expression,
    ExpressionContent,
    StatementContent,
    IfStatement,
    ElifClause,
    ElseClause,
    BlockStatement,
    IncludeStatement,
    ExtendsStatement,
    Path,
    Identifier,
    Comment,
}

impl NodeKind {
    /// Every named node kind, in grammar order.
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Document,
        NodeKind::Content,
        NodeKind::Element,
        NodeKind::StartTag,
        NodeKind::EndTag,
        NodeKind::SelfClosingTag,
        NodeKind::TagName,
        NodeKind::Attribute,
        NodeKind::AttributeName,
        NodeKind::AttributeValue,
        NodeKind::QuotedAttributeValue,
        NodeKind::Expression,
        NodeKind::ExpressionContent,
        NodeKind::StatementContent,
        NodeKind::IfStatement,
        NodeKind::ElifClause,
        NodeKind::ElseClause,
        NodeKind::BlockStatement,
        NodeKind::IncludeStatement,
        NodeKind::ExtendsStatement,
        NodeKind::Path,
        NodeKind::Identifier,
        NodeKind::Comment,
    ];

    /// The grammar name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Content => "content",
            NodeKind::Element => "element",
            NodeKind::StartTag => "start_tag",
            NodeKind::EndTag => "end_tag",
            NodeKind::SelfClosingTag => "self_closing_tag",
            NodeKind::TagName => "tag_name",
            NodeKind::Attribute => "attribute",
            NodeKind::AttributeName => "attribute_name",
            NodeKind::AttributeValue => "attribute_value",
            NodeKind::QuotedAttributeValue => "quoted_attribute_value",
            NodeKind::Expression => "expression",
            NodeKind::ExpressionContent => "expression_content",
            NodeKind::StatementContent => "statement_content",
            NodeKind::IfStatement => "if_statement",
            NodeKind::ElifClause => "elif_clause",
            NodeKind::ElseClause => "else_clause",
            NodeKind::BlockStatement => "block_statement",
            NodeKind::IncludeStatement => "include_statement",
            NodeKind::ExtendsStatement => "extends_statement",
            NodeKind::Path => "path",
            NodeKind::Identifier => "identifier",
            NodeKind::Comment => "comment",
        }
    }

    /// Look up a kind by its grammar name.
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

// ============================================================================
// Syntax tree
// ============================================================================

/// A parsed template: the linear list of top-level nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    location: Location,
}

impl Document {
    pub fn new(nodes: Vec<Node>, location: Location) -> Self {
        Self { nodes, location }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Visit every node in the tree, depth-first, parents before children.
    pub fn for_each_node<F: FnMut(&Node)>(&self, f: &mut F) {
        for node in &self.nodes {
            visit_node(node, f);
        }
    }

    /// Render the tree as a tree-sitter-style s-expression of named kinds.
    pub fn to_sexp(&self) -> String {
        let mut out = String::from("(document");
        for node in &self.nodes {
            out.push(' ');
            node.write_sexp(&mut out);
        }
        out.push(')');
        out
    }
}

fn visit_node<F: FnMut(&Node)>(node: &Node, f: &mut F) {
    f(node);
    match node {
        Node::Element(element) => {
            for child in &element.children {
                visit_node(child, f);
            }
        }
        Node::Statement(Statement::If(stmt)) => {
            for child in &stmt.then_branch {
                visit_node(child, f);
            }
            for branch in &stmt.elif_branches {
                for child in &branch.body {
                    visit_node(child, f);
                }
            }
            if let Some(else_branch) = &stmt.else_branch {
                for child in else_branch {
                    visit_node(child, f);
                }
            }
        }
        Node::Statement(Statement::Block(block)) => {
            for child in &block.body {
                visit_node(child, f);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Expression(Expression),
    Statement(Statement),
    Text(TextNode),
    Comment(CommentNode),
}

impl Node {
    pub fn location(&self) -> Location {
        match self {
            Node::Element(n) => n.location,
            Node::Expression(n) => n.location,
            Node::Statement(n) => n.location(),
            Node::Text(n) => n.location,
            Node::Comment(n) => n.location,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Expression(_) => NodeKind::Expression,
            Node::Statement(s) => s.kind(),
            Node::Text(_) => NodeKind::Content,
            Node::Comment(_) => NodeKind::Comment,
        }
    }

    fn write_sexp(&self, out: &mut String) {
        match self {
            Node::Text(_) => out.push_str("(content)"),
            Node::Comment(_) => out.push_str("(comment)"),
            Node::Expression(_) => out.push_str("(expression (expression_content))"),
            Node::Element(element) => element.write_sexp(out),
            Node::Statement(statement) => statement.write_sexp(out),
        }
    }
}

/// Raw text run between markup.
#[derive(Debug, Clone)]
pub struct TextNode {
    pub content: String,
    pub location: Location,
}

/// HTML comment: `<!-- text -->`.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub text: String,
    pub location: Location,
}

/// Output expression: `{{ content }}`. The content is kept exactly as
/// scanned, delimiters excluded.
#[derive(Debug, Clone)]
pub struct Expression {
    pub content: String,
    pub location: Location,
}

impl Expression {
    /// The expression content with surrounding whitespace trimmed.
    pub fn text(&self) -> &str {
        self.content.trim()
    }
}

/// HTML element: paired start/end tags with children, or a self-closing tag.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub items: Vec<AttrItem>,
    pub children: Vec<Node>,
    pub self_closing: bool,
    pub location: Location,
}

impl Element {
    /// The plain attributes of the tag, skipping conditional groups.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter().filter_map(|item| match item {
            AttrItem::Attribute(attr) => Some(attr),
            AttrItem::Conditional(_) => None,
        })
    }

    /// Look up a plain attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes().find(|attr| attr.name == name)
    }

    fn write_sexp(&self, out: &mut String) {
        out.push_str("(element ");
        if self.self_closing {
            out.push_str("(self_closing_tag (tag_name)");
            for item in &self.items {
                out.push(' ');
                item.write_sexp(out);
            }
            out.push_str("))");
        } else {
            out.push_str("(start_tag (tag_name)");
            for item in &self.items {
                out.push(' ');
                item.write_sexp(out);
            }
            out.push(')');
            for child in &self.children {
                out.push(' ');
                child.write_sexp(out);
            }
            out.push_str(" (end_tag (tag_name)))");
        }
    }
}

/// Attribute-position item: a plain attribute or a conditional group.
#[derive(Debug, Clone)]
pub enum AttrItem {
    Attribute(Attribute),
    Conditional(AttrConditional),
}

impl AttrItem {
    fn write_sexp(&self, out: &mut String) {
        match self {
            AttrItem::Attribute(attr) => attr.write_sexp(out),
            AttrItem::Conditional(cond) => cond.write_sexp(out),
        }
    }
}

/// Tag attribute: `name`, `name=value`, `name="value"` or `name='value'`.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: Option<AttrValue>,
    pub location: Location,
}

impl Attribute {
    fn write_sexp(&self, out: &mut String) {
        out.push_str("(attribute (attribute_name)");
        match &self.value {
            None => {}
            Some(AttrValue::Unquoted(_)) => out.push_str(" (attribute_value)"),
            Some(AttrValue::Quoted(value)) => {
                if value.is_empty() {
                    out.push_str(" (quoted_attribute_value)");
                } else {
                    out.push_str(" (quoted_attribute_value (attribute_value))");
                }
            }
        }
        out.push(')');
    }
}

/// Attribute value, with the quoting form preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Unquoted(String),
    Quoted(String),
}

impl AttrValue {
    pub fn as_str(&self) -> &str {
        match self {
            AttrValue::Unquoted(value) | AttrValue::Quoted(value) => value,
        }
    }
}

/// Conditional group over attribute items inside a tag.
#[derive(Debug, Clone)]
pub struct AttrConditional {
    pub condition: String,
    pub then_items: Vec<AttrItem>,
    pub elif_branches: Vec<AttrElifBranch>,
    pub else_items: Option<Vec<AttrItem>>,
    pub location: Location,
}

impl AttrConditional {
    fn write_sexp(&self, out: &mut String) {
        out.push_str("(if_statement (statement_content)");
        for item in &self.then_items {
            out.push(' ');
            item.write_sexp(out);
        }
        for branch in &self.elif_branches {
            out.push_str(" (elif_clause (statement_content)");
            for item in &branch.items {
                out.push(' ');
                item.write_sexp(out);
            }
            out.push(')');
        }
        if let Some(items) = &self.else_items {
            out.push_str(" (else_clause");
            for item in items {
                out.push(' ');
                item.write_sexp(out);
            }
            out.push(')');
        }
        out.push(')');
    }
}

/// `elif` branch of a conditional attribute group.
#[derive(Debug, Clone)]
pub struct AttrElifBranch {
    pub condition: String,
    pub items: Vec<AttrItem>,
    pub location: Location,
}

/// Template statement: `{% ... %}`.
#[derive(Debug, Clone)]
pub enum Statement {
    If(IfStatement),
    Block(BlockStatement),
    Include(IncludeStatement),
    Extends(ExtendsStatement),
}

impl Statement {
    pub fn location(&self) -> Location {
        match self {
            Statement::If(s) => s.location,
            Statement::Block(s) => s.location,
            Statement::Include(s) => s.location,
            Statement::Extends(s) => s.location,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Statement::If(_) => NodeKind::IfStatement,
            Statement::Block(_) => NodeKind::BlockStatement,
            Statement::Include(_) => NodeKind::IncludeStatement,
            Statement::Extends(_) => NodeKind::ExtendsStatement,
        }
    }

    fn write_sexp(&self, out: &mut String) {
        match self {
            Statement::If(stmt) => stmt.write_sexp(out),
            Statement::Block(block) => {
                out.push_str("(block_statement (identifier)");
                for child in &block.body {
                    out.push(' ');
                    child.write_sexp(out);
                }
                out.push(')');
            }
            Statement::Include(_) => out.push_str("(include_statement (path))"),
            Statement::Extends(_) => out.push_str("(extends_statement (path))"),
        }
    }
}

/// Conditional: `{% if c %} ... {% elif c %} ... {% else %} ... {% endif %}`.
#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: String,
    pub then_branch: Vec<Node>,
    pub elif_branches: Vec<ElifBranch>,
    pub else_branch: Option<Vec<Node>>,
    pub location: Location,
}

impl IfStatement {
    /// The condition with surrounding whitespace trimmed.
    pub fn condition_text(&self) -> &str {
        self.condition.trim()
    }

    fn write_sexp(&self, out: &mut String) {
        out.push_str("(if_statement (statement_content)");
        for child in &self.then_branch {
            out.push(' ');
            child.write_sexp(out);
        }
        for branch in &self.elif_branches {
            out.push_str(" (elif_clause (statement_content)");
            for child in &branch.body {
                out.push(' ');
                child.write_sexp(out);
            }
            out.push(')');
        }
        if let Some(else_branch) = &self.else_branch {
            out.push_str(" (else_clause");
            for child in else_branch {
                out.push(' ');
                child.write_sexp(out);
            }
            out.push(')');
        }
        out.push(')');
    }
}

/// `elif` branch of a conditional.
#[derive(Debug, Clone)]
pub struct ElifBranch {
    pub condition: String,
    pub body: Vec<Node>,
    pub location: Location,
}

/// Named block: `{% block name %} ... {% endblock %}`.
#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub name: String,
    pub body: Vec<Node>,
    pub location: Location,
}

/// Include directive: `{% include "path" %}`.
#[derive(Debug, Clone)]
pub struct IncludeStatement {
    pub path: String,
    pub location: Location,
}

/// Extends directive: `{% extends "path" %}`.
#[derive(Debug, Clone)]
pub struct ExtendsStatement {
    pub path: String,
    pub location: Location,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected token at line {line}, column {column}: {message}")]
    UnexpectedToken {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("unsupported statement '{keyword}' at line {line}, column {column}")]
    UnsupportedStatement {
        keyword: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected '{keyword}' statement at line {line}, column {column}")]
    StrayStatement {
        keyword: String,
        line: usize,
        column: usize,
    },

    #[error("end tag '</{found}>' does not match '<{expected}>' at line {line}, column {column}")]
    MismatchedEndTag {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected end tag '</{name}>' at line {line}, column {column}")]
    UnexpectedEndTag {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("unclosed element '<{name}>' at line {line}, column {column}")]
    UnclosedElement {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("unclosed comment at line {line}, column {column}")]
    UnclosedComment { line: usize, column: usize },

    #[error("missing closing '{delimiter}' for the construct at line {line}, column {column}")]
    UnclosedDelimiter {
        delimiter: &'static str,
        line: usize,
        column: usize,
    },
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a template source string into a syntax tree.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(tokens)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_source_is_an_empty_document() {
        let document = parse("").unwrap();
        assert!(document.nodes().is_empty());
        assert_eq!(document.to_sexp(), "(document)");
    }

    #[test]
    fn content_keeps_punctuation() {
        let document = parse("Hello, World!").unwrap();
        match &document.nodes()[0] {
            Node::Text(text) => assert_eq!(text.content, "Hello, World!"),
            _ => panic!("expected content node"),
        }
    }

    #[test]
    fn expression_location_and_text() {
        let document = parse("Hi, {{ user.name }}!").unwrap();
        assert_eq!(document.nodes().len(), 3);
        match &document.nodes()[1] {
            Node::Expression(expr) => {
                assert_eq!(expr.content, " user.name ");
                assert_eq!(expr.text(), "user.name");
                assert_eq!(expr.location.line, 1);
                assert_eq!(expr.location.column, 5);
            }
            _ => panic!("expected expression node"),
        }
    }

    #[test]
    fn element_sexp() {
        let document = parse(r#"<a href="x">go</a>"#).unwrap();
        assert_eq!(
            document.to_sexp(),
            "(document (element (start_tag (tag_name) (attribute (attribute_name) \
             (quoted_attribute_value (attribute_value)))) (content) (end_tag (tag_name))))"
        );
    }

    #[test]
    fn empty_quoted_value_sexp() {
        let document = parse(r#"<a href="">x</a>"#).unwrap();
        assert_eq!(
            document.to_sexp(),
            "(document (element (start_tag (tag_name) (attribute (attribute_name) \
             (quoted_attribute_value))) (content) (end_tag (tag_name))))"
        );
    }

    #[test]
    fn if_statement_sexp() {
        let document = parse("{% if a %}1{% elif b %}2{% else %}3{% endif %}").unwrap();
        assert_eq!(
            document.to_sexp(),
            "(document (if_statement (statement_content) (content) \
             (elif_clause (statement_content) (content)) (else_clause (content))))"
        );
    }

    #[test]
    fn attribute_lookup() {
        let document = parse(r#"<img src="logo.png" width=32 />"#).unwrap();
        match &document.nodes()[0] {
            Node::Element(element) => {
                assert!(element.self_closing);
                assert_eq!(element.attribute("src").unwrap().value.as_ref().unwrap().as_str(), "logo.png");
                assert_eq!(
                    element.attribute("width").unwrap().value,
                    Some(AttrValue::Unquoted("32".to_string()))
                );
                assert!(element.attribute("height").is_none());
            }
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn for_each_node_reaches_nested_statements() {
        let document = parse(
            "{% block body %}{% if x %}{% include \"a.html\" %}{% endif %}{% endblock %}",
        )
        .unwrap();
        let mut kinds = Vec::new();
        document.for_each_node(&mut |node| kinds.push(node.kind()));
        assert_eq!(
            kinds,
            vec![
                NodeKind::BlockStatement,
                NodeKind::IfStatement,
                NodeKind::IncludeStatement,
            ]
        );
    }

    #[test]
    fn node_kind_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.as_str()), Some(*kind));
        }
        assert_eq!(NodeKind::from_name("no_such_kind"), None);
    }

    #[test]
    fn error_carries_location() {
        let result = parse("line one\n<div></span>");
        match result {
            Err(ParseError::MismatchedEndTag { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 6);
            }
            other => panic!("expected mismatched end tag, got {other:?}"),
        }
    }
}
