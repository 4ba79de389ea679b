//! Recursive descent parser for Htmlaskama templates.
//!
//! Consumes the lexer's token stream and produces a typed syntax tree.
//! Paired constructs (`if`/`elif`/`else`/`endif`, `block`/`endblock`,
//! start/end tags) nest properly; stray or crossing closers are reported as
//! parse errors with their source location.

use crate::token::{Token, TokenType};
use crate::{
    AttrConditional, AttrElifBranch, AttrItem, AttrValue, Attribute, BlockStatement, CommentNode,
    Document, ElifBranch, Element, Expression, ExtendsStatement, IfStatement, IncludeStatement,
    Location, Node, ParseError, Statement, TextNode,
};

/// Parse a token stream into a syntax tree.
pub(crate) fn parse(tokens: Vec<Token>) -> Result<Document, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse_document()
}

const IF_CLOSERS: &[TokenType] = &[TokenType::KwElif, TokenType::KwElse, TokenType::KwEndif];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_document(&mut self) -> Result<Document, ParseError> {
        let mut nodes = Vec::new();
        while self.current_type() != TokenType::Eof {
            nodes.push(self.parse_node()?);
        }
        Ok(Document::new(nodes, Location::new(1, 1, 0)))
    }

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        match self.current_type() {
            TokenType::Text => {
                let token = self.consume(TokenType::Text)?;
                Ok(Node::Text(TextNode {
                    content: token.value,
                    location: token.location,
                }))
            }
            TokenType::Comment => {
                let token = self.consume(TokenType::Comment)?;
                Ok(Node::Comment(CommentNode {
                    text: token.value,
                    location: token.location,
                }))
            }
            TokenType::ExprOpen => self.parse_expression(),
            TokenType::TagOpen => self.parse_element(),
            TokenType::EndTagOpen => {
                let open = self.consume(TokenType::EndTagOpen)?;
                let name = match self.current_token() {
                    Some(t) if t.token_type == TokenType::Word => t.value.clone(),
                    _ => String::new(),
                };
                Err(ParseError::UnexpectedEndTag {
                    name,
                    line: open.location.line,
                    column: open.location.column,
                })
            }
            TokenType::StmtOpen => Ok(Node::Statement(self.parse_statement()?)),
            _ => self.unexpected_token(None),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let open = self.consume(TokenType::ExprOpen)?;
        let content = self.consume(TokenType::RawContent)?;
        if self.current_type() != TokenType::ExprClose {
            return Err(ParseError::UnclosedDelimiter {
                delimiter: "}}",
                line: open.location.line,
                column: open.location.column,
            });
        }
        self.advance();
        Ok(Node::Expression(Expression {
            content: content.value,
            location: open.location,
        }))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let open = self.consume(TokenType::StmtOpen)?;
        match self.current_type() {
            TokenType::KwIf => self.parse_if_statement(open.location),
            TokenType::KwBlock => self.parse_block_statement(open.location),
            TokenType::KwInclude => self.parse_include_statement(open.location),
            TokenType::KwExtends => self.parse_extends_statement(open.location),
            TokenType::KwElif | TokenType::KwElse | TokenType::KwEndif | TokenType::KwEndblock => {
                Err(self.stray_statement())
            }
            TokenType::Ident => Err(self.unsupported_statement()),
            _ => self.unexpected_token(Some("expected statement keyword")),
        }
    }

    fn parse_if_statement(&mut self, opened: Location) -> Result<Statement, ParseError> {
        let kw = self.consume(TokenType::KwIf)?;
        let condition = self.consume(TokenType::RawContent)?.value;
        self.expect_statement_close(opened)?;

        let then_branch = self.parse_body(IF_CLOSERS)?;

        let mut elif_branches = Vec::new();
        while self.at_statement(TokenType::KwElif) {
            let elif_open = self.consume(TokenType::StmtOpen)?;
            let elif_kw = self.consume(TokenType::KwElif)?;
            let elif_condition = self.consume(TokenType::RawContent)?.value;
            self.expect_statement_close(elif_open.location)?;
            let body = self.parse_body(IF_CLOSERS)?;
            elif_branches.push(ElifBranch {
                condition: elif_condition,
                body,
                location: elif_kw.location,
            });
        }

        let else_branch = if self.at_statement(TokenType::KwElse) {
            let else_open = self.consume(TokenType::StmtOpen)?;
            self.consume(TokenType::KwElse)?;
            self.expect_statement_close(else_open.location)?;
            Some(self.parse_body(&[TokenType::KwEndif])?)
        } else {
            None
        };

        self.consume_paired_close(TokenType::KwEndif)?;

        Ok(Statement::If(IfStatement {
            condition,
            then_branch,
            elif_branches,
            else_branch,
            location: kw.location,
        }))
    }

    fn parse_block_statement(&mut self, opened: Location) -> Result<Statement, ParseError> {
        let kw = self.consume(TokenType::KwBlock)?;
        let name = match self.current_type() {
            TokenType::Ident => self.consume(TokenType::Ident)?.value,
            _ => return self.unexpected_token(Some("expected block name")),
        };
        self.expect_statement_close(opened)?;
        let body = self.parse_body(&[TokenType::KwEndblock])?;
        self.consume_paired_close(TokenType::KwEndblock)?;

        Ok(Statement::Block(BlockStatement {
            name,
            body,
            location: kw.location,
        }))
    }

    fn parse_include_statement(&mut self, opened: Location) -> Result<Statement, ParseError> {
        let kw = self.consume(TokenType::KwInclude)?;
        let path = self.expect_path()?;
        self.expect_statement_close(opened)?;
        Ok(Statement::Include(IncludeStatement {
            path,
            location: kw.location,
        }))
    }

    fn parse_extends_statement(&mut self, opened: Location) -> Result<Statement, ParseError> {
        let kw = self.consume(TokenType::KwExtends)?;
        let path = self.expect_path()?;
        self.expect_statement_close(opened)?;
        Ok(Statement::Extends(ExtendsStatement {
            path,
            location: kw.location,
        }))
    }

    fn expect_path(&mut self) -> Result<String, ParseError> {
        match self.current_type() {
            TokenType::Str => Ok(self.consume(TokenType::Str)?.value),
            _ => self.unexpected_token(Some("expected quoted template path")),
        }
    }

    /// Parse nodes until EOF or a `{% <closer> %}` lookahead at this level.
    fn parse_body(&mut self, closers: &[TokenType]) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        while self.current_type() != TokenType::Eof && !self.at_any_statement(closers) {
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    // ========================================================================
    // Elements
    // ========================================================================

    fn parse_element(&mut self) -> Result<Node, ParseError> {
        let open = self.consume(TokenType::TagOpen)?;
        let name = self.expect_tag_name()?;
        let items = self.parse_attr_items(&[])?;

        match self.current_type() {
            TokenType::SelfClose => {
                self.advance();
                Ok(Node::Element(Element {
                    name,
                    items,
                    children: Vec::new(),
                    self_closing: true,
                    location: open.location,
                }))
            }
            TokenType::TagClose => {
                self.advance();
                let children = self.parse_element_children(&name, open.location)?;
                Ok(Node::Element(Element {
                    name,
                    items,
                    children,
                    self_closing: false,
                    location: open.location,
                }))
            }
            TokenType::Eof => Err(ParseError::UnclosedDelimiter {
                delimiter: ">",
                line: open.location.line,
                column: open.location.column,
            }),
            _ => self.unexpected_token(Some("expected '>' or '/>'")),
        }
    }

    fn parse_element_children(
        &mut self,
        name: &str,
        opened: Location,
    ) -> Result<Vec<Node>, ParseError> {
        let mut children = Vec::new();
        loop {
            match self.current_type() {
                TokenType::Eof => {
                    return Err(ParseError::UnclosedElement {
                        name: name.to_string(),
                        line: opened.line,
                        column: opened.column,
                    });
                }
                TokenType::EndTagOpen => {
                    let end_open = self.consume(TokenType::EndTagOpen)?;
                    let end_name = self.expect_tag_name()?;
                    match self.current_type() {
                        TokenType::TagClose => self.advance(),
                        TokenType::Eof => {
                            return Err(ParseError::UnclosedDelimiter {
                                delimiter: ">",
                                line: end_open.location.line,
                                column: end_open.location.column,
                            })
                        }
                        _ => return self.unexpected_token(Some("expected '>'")),
                    }
                    if end_name != name {
                        return Err(ParseError::MismatchedEndTag {
                            expected: name.to_string(),
                            found: end_name,
                            line: end_open.location.line,
                            column: end_open.location.column,
                        });
                    }
                    return Ok(children);
                }
                _ => children.push(self.parse_node()?),
            }
        }
    }

    fn expect_tag_name(&mut self) -> Result<String, ParseError> {
        match self.current_type() {
            TokenType::Word => {
                let token = self.consume(TokenType::Word)?;
                if !token.value.bytes().all(is_tag_name_byte) {
                    return Err(ParseError::SyntaxError {
                        message: format!("invalid tag name '{}'", token.value),
                        line: token.location.line,
                        column: token.location.column,
                    });
                }
                Ok(token.value)
            }
            _ => self.unexpected_token(Some("expected tag name")),
        }
    }

    /// Parse attribute-position items: plain attributes and `if` conditionals
    /// over attribute groups. Returns on `>` / `/>` / EOF, or when the next
    /// statement keyword is one of `stmt_closers` (so the enclosing
    /// conditional can consume it).
    fn parse_attr_items(&mut self, stmt_closers: &[TokenType]) -> Result<Vec<AttrItem>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.current_type() {
                TokenType::Word => items.push(AttrItem::Attribute(self.parse_attribute()?)),
                TokenType::StmtOpen => {
                    let keyword = self.peek_type(1);
                    if keyword == TokenType::KwIf {
                        items.push(AttrItem::Conditional(self.parse_attr_conditional()?));
                    } else if stmt_closers.contains(&keyword) {
                        return Ok(items);
                    } else if matches!(
                        keyword,
                        TokenType::KwElif
                            | TokenType::KwElse
                            | TokenType::KwEndif
                            | TokenType::KwEndblock
                    ) {
                        self.advance();
                        return Err(self.stray_statement());
                    } else if keyword == TokenType::Ident {
                        self.advance();
                        return Err(self.unsupported_statement());
                    } else {
                        self.advance();
                        return self
                            .unexpected_token(Some("only 'if' statements may appear inside a tag"));
                    }
                }
                TokenType::TagClose | TokenType::SelfClose | TokenType::Eof => return Ok(items),
                _ => return self.unexpected_token(None),
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let name = self.consume(TokenType::Word)?;
        let mut value = None;
        if self.current_type() == TokenType::Equal {
            self.advance();
            value = Some(match self.current_type() {
                TokenType::QuotedValue => {
                    AttrValue::Quoted(self.consume(TokenType::QuotedValue)?.value)
                }
                TokenType::UnquotedValue => {
                    AttrValue::Unquoted(self.consume(TokenType::UnquotedValue)?.value)
                }
                _ => return self.unexpected_token(Some("expected attribute value")),
            });
        }
        Ok(Attribute {
            name: name.value,
            value,
            location: name.location,
        })
    }

    fn parse_attr_conditional(&mut self) -> Result<AttrConditional, ParseError> {
        let open = self.consume(TokenType::StmtOpen)?;
        let kw = self.consume(TokenType::KwIf)?;
        let condition = self.consume(TokenType::RawContent)?.value;
        self.expect_statement_close(open.location)?;

        let then_items = self.parse_attr_items(IF_CLOSERS)?;

        let mut elif_branches = Vec::new();
        while self.at_statement(TokenType::KwElif) {
            let elif_open = self.consume(TokenType::StmtOpen)?;
            let elif_kw = self.consume(TokenType::KwElif)?;
            let elif_condition = self.consume(TokenType::RawContent)?.value;
            self.expect_statement_close(elif_open.location)?;
            let branch_items = self.parse_attr_items(IF_CLOSERS)?;
            elif_branches.push(AttrElifBranch {
                condition: elif_condition,
                items: branch_items,
                location: elif_kw.location,
            });
        }

        let else_items = if self.at_statement(TokenType::KwElse) {
            let else_open = self.consume(TokenType::StmtOpen)?;
            self.consume(TokenType::KwElse)?;
            self.expect_statement_close(else_open.location)?;
            Some(self.parse_attr_items(&[TokenType::KwEndif])?)
        } else {
            None
        };

        self.consume_paired_close(TokenType::KwEndif)?;

        Ok(AttrConditional {
            condition,
            then_items,
            elif_branches,
            else_items,
            location: kw.location,
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// True when the next two tokens are `{%` followed by `keyword`.
    fn at_statement(&self, keyword: TokenType) -> bool {
        self.current_type() == TokenType::StmtOpen && self.peek_type(1) == keyword
    }

    fn at_any_statement(&self, keywords: &[TokenType]) -> bool {
        self.current_type() == TokenType::StmtOpen && keywords.contains(&self.peek_type(1))
    }

    /// Consume a `{% keyword %}` closer, e.g. `{% endif %}`.
    fn consume_paired_close(&mut self, keyword: TokenType) -> Result<(), ParseError> {
        if !self.at_statement(keyword) {
            let loc = self.current_location();
            return Err(ParseError::UnexpectedToken {
                message: format!("expected '{{% {} %}}'", keyword_name(keyword)),
                line: loc.line,
                column: loc.column,
            });
        }
        let open = self.consume(TokenType::StmtOpen)?;
        self.advance();
        self.expect_statement_close(open.location)
    }

    fn expect_statement_close(&mut self, opened: Location) -> Result<(), ParseError> {
        match self.current_type() {
            TokenType::StmtClose => {
                self.advance();
                Ok(())
            }
            TokenType::Eof => Err(ParseError::UnclosedDelimiter {
                delimiter: "%}",
                line: opened.line,
                column: opened.column,
            }),
            _ => self.unexpected_token(Some("expected '%}'")),
        }
    }

    /// Build the error for a closer keyword with no matching opener in scope.
    /// The current token must be the keyword itself.
    fn stray_statement(&mut self) -> ParseError {
        let (keyword, loc) = match self.current_token() {
            Some(t) => (t.value.clone(), t.location),
            None => (String::new(), Location::default()),
        };
        self.advance();
        ParseError::StrayStatement {
            keyword,
            line: loc.line,
            column: loc.column,
        }
    }

    /// Build the error for a statement keyword the grammar does not know.
    /// The current token must be the keyword itself.
    fn unsupported_statement(&mut self) -> ParseError {
        let (keyword, loc) = match self.current_token() {
            Some(t) => (t.value.clone(), t.location),
            None => (String::new(), Location::default()),
        };
        self.advance();
        ParseError::UnsupportedStatement {
            keyword,
            line: loc.line,
            column: loc.column,
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_type(&self) -> TokenType {
        self.current_token()
            .map(|t| t.token_type)
            .unwrap_or(TokenType::Eof)
    }

    fn peek_type(&self, offset: usize) -> TokenType {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.token_type)
            .unwrap_or(TokenType::Eof)
    }

    fn current_location(&self) -> Location {
        self.current_token()
            .map(|t| t.location)
            .unwrap_or_default()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn consume(&mut self, expected: TokenType) -> Result<Token, ParseError> {
        let token = self.current_token().cloned();
        match token {
            Some(t) if t.token_type == expected => {
                self.advance();
                Ok(t)
            }
            Some(t) => Err(ParseError::UnexpectedToken {
                message: format!("expected {:?}, got {:?}", expected, t.token_type),
                line: t.location.line,
                column: t.location.column,
            }),
            None => Err(ParseError::UnexpectedToken {
                message: format!("expected {:?}, got end of input", expected),
                line: 0,
                column: 0,
            }),
        }
    }

    fn unexpected_token<T>(&self, message: Option<&str>) -> Result<T, ParseError> {
        let loc = self.current_location();
        let msg = match (message, self.current_token()) {
            (Some(m), Some(t)) => format!("{}: {:?}", m, t.token_type),
            (Some(m), None) => m.to_string(),
            (None, Some(t)) => format!("unexpected token: {:?}", t.token_type),
            (None, None) => "unexpected end of input".to_string(),
        };
        Err(ParseError::UnexpectedToken {
            message: msg,
            line: loc.line,
            column: loc.column,
        })
    }
}

fn is_tag_name_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
}

fn keyword_name(keyword: TokenType) -> &'static str {
    match keyword {
        TokenType::KwIf => "if",
        TokenType::KwElif => "elif",
        TokenType::KwElse => "else",
        TokenType::KwEndif => "endif",
        TokenType::KwBlock => "block",
        TokenType::KwEndblock => "endblock",
        TokenType::KwInclude => "include",
        TokenType::KwExtends => "extends",
        _ => "statement",
    }
}
