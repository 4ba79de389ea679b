//! Corpus-style integration tests: template source in, s-expression out.

use htmlaskama::{parse, HtmlaskamaError, ParseError};
use pretty_assertions::assert_eq;

fn sexp(source: &str) -> String {
    parse(source)
        .unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"))
        .to_sexp()
}

#[test]
fn can_load_grammar() {
    let language = htmlaskama::language();
    assert!(
        language.node_kind_count() > 0,
        "Error loading Htmlaskama grammar"
    );
}

// ============================================================================
// Content and comments
// ============================================================================

#[test]
fn empty_document() {
    assert_eq!(sexp(""), "(document)");
}

#[test]
fn plain_content() {
    assert_eq!(sexp("Hello, World!"), "(document (content))");
}

#[test]
fn whitespace_between_nodes_is_extra() {
    assert_eq!(
        sexp("<p>x</p>\n  <p>y</p>"),
        "(document (element (start_tag (tag_name)) (content) (end_tag (tag_name))) \
         (element (start_tag (tag_name)) (content) (end_tag (tag_name))))"
    );
}

#[test]
fn html_comment() {
    assert_eq!(
        sexp("before <!-- note --> after"),
        "(document (content) (comment) (content))"
    );
}

#[test]
fn comment_with_inner_dashes() {
    assert_eq!(sexp("<!-- a -- b -->"), "(document (comment))");
}

// ============================================================================
// Elements and attributes
// ============================================================================

#[test]
fn bare_element() {
    assert_eq!(
        sexp("<div></div>"),
        "(document (element (start_tag (tag_name)) (end_tag (tag_name))))"
    );
}

#[test]
fn self_closing_element() {
    assert_eq!(
        sexp("<br/>"),
        "(document (element (self_closing_tag (tag_name))))"
    );
}

#[test]
fn attributes_in_every_form() {
    assert_eq!(
        sexp(r#"<input type=text disabled value="x" placeholder=''/>"#),
        "(document (element (self_closing_tag (tag_name) \
         (attribute (attribute_name) (attribute_value)) \
         (attribute (attribute_name)) \
         (attribute (attribute_name) (quoted_attribute_value (attribute_value))) \
         (attribute (attribute_name) (quoted_attribute_value)))))"
    );
}

#[test]
fn nested_elements() {
    assert_eq!(
        sexp("<ul><li>one</li><li>two</li></ul>"),
        "(document (element (start_tag (tag_name)) \
         (element (start_tag (tag_name)) (content) (end_tag (tag_name))) \
         (element (start_tag (tag_name)) (content) (end_tag (tag_name))) \
         (end_tag (tag_name))))"
    );
}

#[test]
fn whitespace_inside_tags_is_extra() {
    assert_eq!(
        sexp("< div class = \"a\" ></ div >"),
        "(document (element (start_tag (tag_name) (attribute (attribute_name) \
         (quoted_attribute_value (attribute_value)))) (end_tag (tag_name))))"
    );
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn expression_in_content() {
    assert_eq!(
        sexp("Hi {{ user.name }}!"),
        "(document (content) (expression (expression_content)) (content))"
    );
}

#[test]
fn expression_with_filters_stays_raw() {
    assert_eq!(
        sexp(r#"{{ items|join(", ") }}"#),
        "(document (expression (expression_content)))"
    );
}

#[test]
fn empty_expression() {
    assert_eq!(sexp("{{}}"), "(document (expression (expression_content)))");
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn extends_statement() {
    assert_eq!(
        sexp(r#"{% extends "base.html" %}"#),
        "(document (extends_statement (path)))"
    );
}

#[test]
fn include_statement() {
    assert_eq!(
        sexp(r#"{% include "partials/nav.html" %}"#),
        "(document (include_statement (path)))"
    );
}

#[test]
fn block_statement() {
    assert_eq!(
        sexp("{% block content %}<p>x</p>{% endblock %}"),
        "(document (block_statement (identifier) \
         (element (start_tag (tag_name)) (content) (end_tag (tag_name)))))"
    );
}

#[test]
fn if_statement_with_all_branches() {
    assert_eq!(
        sexp("{% if a %}1{% elif b %}2{% elif c %}3{% else %}4{% endif %}"),
        "(document (if_statement (statement_content) (content) \
         (elif_clause (statement_content) (content)) \
         (elif_clause (statement_content) (content)) \
         (else_clause (content))))"
    );
}

#[test]
fn nested_if_statements() {
    assert_eq!(
        sexp("{% if a %}{% if b %}x{% endif %}{% endif %}"),
        "(document (if_statement (statement_content) \
         (if_statement (statement_content) (content))))"
    );
}

#[test]
fn conditional_attribute_group() {
    assert_eq!(
        sexp(r#"<div {% if admin %}class="admin"{% else %}class="user"{% endif %}>x</div>"#),
        "(document (element (start_tag (tag_name) (if_statement (statement_content) \
         (attribute (attribute_name) (quoted_attribute_value (attribute_value))) \
         (else_clause (attribute (attribute_name) (quoted_attribute_value (attribute_value)))))) \
         (content) (end_tag (tag_name))))"
    );
}

#[test]
fn full_template_shape() {
    let source = concat!(
        "{% extends \"base.html\" %}\n",
        "{% block body %}\n",
        "  <section id=\"main\">\n",
        "    {% if items %}\n",
        "      {{ items|count }}\n",
        "    {% else %}\n",
        "      <!-- nothing to show -->\n",
        "    {% endif %}\n",
        "  </section>\n",
        "{% endblock %}\n",
    );
    assert_eq!(
        sexp(source),
        "(document (extends_statement (path)) (block_statement (identifier) \
         (element (start_tag (tag_name) (attribute (attribute_name) \
         (quoted_attribute_value (attribute_value)))) (if_statement (statement_content) \
         (expression (expression_content)) (else_clause (comment))) (end_tag (tag_name)))))"
    );
}

// ============================================================================
// Errors
// ============================================================================

fn parse_error(source: &str) -> ParseError {
    match parse(source) {
        Err(HtmlaskamaError::Parse(e)) => e,
        Ok(_) => panic!("expected {source:?} to fail"),
        Err(other) => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn unclosed_element() {
    assert!(matches!(
        parse_error("<div><p>x</p>"),
        ParseError::UnclosedElement { ref name, .. } if name == "div"
    ));
}

#[test]
fn mismatched_end_tag() {
    assert!(matches!(
        parse_error("<div></span>"),
        ParseError::MismatchedEndTag { ref expected, ref found, .. }
            if expected == "div" && found == "span"
    ));
}

#[test]
fn end_tag_without_start() {
    assert!(matches!(
        parse_error("</div>"),
        ParseError::UnexpectedEndTag { ref name, .. } if name == "div"
    ));
}

#[test]
fn stray_endif() {
    assert!(matches!(
        parse_error("{% endif %}"),
        ParseError::StrayStatement { ref keyword, .. } if keyword == "endif"
    ));
}

#[test]
fn stray_else() {
    assert!(matches!(
        parse_error("x{% else %}y"),
        ParseError::StrayStatement { ref keyword, .. } if keyword == "else"
    ));
}

#[test]
fn crossing_element_and_statement() {
    assert!(matches!(
        parse_error("{% if x %}<div>{% endif %}</div>"),
        ParseError::StrayStatement { ref keyword, .. } if keyword == "endif"
    ));
}

#[test]
fn unsupported_statement_keyword() {
    assert!(matches!(
        parse_error("{% for item in items %}{% endfor %}"),
        ParseError::UnsupportedStatement { ref keyword, .. } if keyword == "for"
    ));
}

#[test]
fn unclosed_expression() {
    assert!(matches!(
        parse_error("{{ name"),
        ParseError::UnclosedDelimiter { delimiter: "}}", .. }
    ));
}

#[test]
fn unclosed_statement() {
    assert!(matches!(
        parse_error("{% if x "),
        ParseError::UnclosedDelimiter { delimiter: "%}", .. }
    ));
}

#[test]
fn unclosed_comment() {
    assert!(matches!(
        parse_error("<!-- forever"),
        ParseError::UnclosedComment { .. }
    ));
}

#[test]
fn missing_block_name() {
    assert!(matches!(
        parse_error("{% block %}{% endblock %}"),
        ParseError::UnexpectedToken { .. }
    ));
}

#[test]
fn missing_include_path() {
    assert!(matches!(
        parse_error("{% include nav %}"),
        ParseError::UnexpectedToken { .. }
    ));
}
